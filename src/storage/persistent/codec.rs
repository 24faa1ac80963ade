//! Binary codec for durable storage entries.
//!
//! Every record on disk is framed the same way:
//! - JSON payload (keeps the serde attributes on the domain types honest)
//! - length prefix for framing
//! - CRC32 checksum for corruption detection
//! - version byte for forward compatibility

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current codec version.
const CODEC_VERSION: u8 = 1;

/// Magic bytes identifying gridiron save files.
pub const MAGIC: [u8; 4] = *b"GRID";

/// Largest entry we will accept; a whole-league segment stays far below this.
const MAX_ENTRY_SIZE: usize = 64 * 1024 * 1024;

/// Serializes a value to bytes with checksum.
///
/// Format:
/// ```text
/// [version: 1 byte][length: 4 bytes LE][data: N bytes JSON][crc32: 4 bytes LE]
/// ```
pub fn encode<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let data = serde_json::to_vec(value)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("serialization failed: {e}")))?;

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let crc = hasher.finalize();

    let len = u32::try_from(data.len())
        .map_err(|_| IoError::new(ErrorKind::InvalidData, "entry too large to frame"))?;

    let mut out = Vec::with_capacity(1 + 4 + data.len() + 4);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&crc.to_le_bytes());

    Ok(out)
}

/// Deserializes a value, verifying the checksum.
///
/// # Errors
/// - Checksum mismatch (corruption)
/// - Unsupported codec version
/// - Deserialization failure
pub fn decode<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<T> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;

    if version[0] != CODEC_VERSION {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!(
                "unsupported codec version: {} (expected {CODEC_VERSION})",
                version[0]
            ),
        ));
    }

    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_ENTRY_SIZE {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("entry size {len} exceeds maximum {MAX_ENTRY_SIZE}"),
        ));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    let mut crc_bytes = [0u8; 4];
    reader.read_exact(&mut crc_bytes)?;
    let stored_crc = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let computed_crc = hasher.finalize();

    if stored_crc != computed_crc {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("CRC mismatch: stored={stored_crc:08x}, computed={computed_crc:08x}"),
        ));
    }

    serde_json::from_slice(&data)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("deserialization failed: {e}")))
}

/// Write the file header (magic + version).
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])?;
    Ok(())
}

/// Read and validate the file header, returning the version byte.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;

    if magic != MAGIC {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("invalid magic bytes: expected {MAGIC:?}, got {magic:?}"),
        ));
    }

    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;

    Ok(version[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::game::{GameId, GameRecord};
    use crate::season::SeasonId;
    use crate::team::TeamId;

    #[test]
    fn roundtrip_simple_value() {
        let value = "hello, league".to_string();
        let encoded = encode(&value).unwrap();

        let mut cursor = Cursor::new(encoded);
        let decoded: String = decode(&mut cursor).unwrap();

        assert_eq!(value, decoded);
    }

    #[test]
    fn roundtrip_game_record() {
        let game = GameRecord {
            id: GameId {
                season: SeasonId(1),
                week: 1,
                home: TeamId(0),
                away: TeamId(1),
            },
            home_score: 24,
            away_score: 10,
            box_score: Some(serde_json::json!({"drives": 11})),
        };

        let encoded = encode(&game).unwrap();
        let mut cursor = Cursor::new(encoded);
        let decoded: GameRecord = decode(&mut cursor).unwrap();

        assert_eq!(decoded.id, game.id);
        assert_eq!(decoded.home_score, 24);
        assert_eq!(decoded.box_score, game.box_score);
    }

    #[test]
    fn detects_corruption() {
        let value = "test data".to_string();
        let mut encoded = encode(&value).unwrap();

        // Flip a byte in the data section.
        if encoded.len() > 10 {
            encoded[10] ^= 0xFF;
        }

        let mut cursor = Cursor::new(encoded);
        let result: IoResult<String> = decode(&mut cursor);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_oversized_entry() {
        let mut bad_data = vec![1u8]; // CODEC_VERSION
        bad_data.extend_from_slice(&(200_000_000u32).to_le_bytes());

        let mut cursor = Cursor::new(bad_data);
        let result: IoResult<String> = decode(&mut cursor);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn header_roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();

        let mut cursor = Cursor::new(buf);
        let version = read_header(&mut cursor).unwrap();

        assert_eq!(version, 1);
    }

    #[test]
    fn rejects_foreign_magic() {
        let mut cursor = Cursor::new(b"LEAG\x01".to_vec());
        assert!(read_header(&mut cursor).is_err());
    }
}
