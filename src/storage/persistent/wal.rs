//! Write-Ahead Log for crash recovery.
//!
//! Every mutation is appended to the log before it is applied to the
//! in-memory indexes; replaying the log on startup restores state after a
//! crash. Bulk operations append a single [`WalEntryKind::Batch`] entry, so a
//! torn write can never leave half a batch durable: the CRC framing rejects
//! the partial entry and the whole batch is dropped together.
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [ENTRY 1: codec-encoded WalEntry]
//! [ENTRY 2: codec-encoded WalEntry]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Result as IoResult, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::draft::{DraftPick, PickId};
use crate::game::{GameId, GameRecord};
use crate::meta::LeagueMeta;
use crate::player::{Player, PlayerId};
use crate::season::{SeasonId, SeasonSummary};
use crate::stats::{PlayerSeasonStat, StatKey};
use crate::team::{Team, TeamId};

use super::codec;

/// A single entry in the write-ahead log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    /// Monotonically increasing sequence number.
    pub sequence: u64,
    /// When this entry was written.
    pub timestamp: DateTime<Utc>,
    /// The operation being logged.
    pub kind: WalEntryKind,
}

/// The type of WAL entry, one variant per collection mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalEntryKind {
    /// Write the metadata singleton.
    MetaPut(LeagueMeta),
    /// Remove the metadata singleton.
    MetaClear,

    /// Insert or replace a team.
    TeamPut(Team),
    /// Delete a team.
    TeamDelete {
        /// Key being deleted.
        id: TeamId,
    },
    /// Drop the teams collection.
    TeamsClear,

    /// Insert or replace a player.
    PlayerPut(Player),
    /// Delete a player.
    PlayerDelete {
        /// Key being deleted.
        id: PlayerId,
    },
    /// Drop the players collection.
    PlayersClear,

    /// Insert or replace a game record.
    GamePut(GameRecord),
    /// Delete a game record.
    GameDelete {
        /// Key being deleted.
        id: GameId,
    },
    /// Drop the games collection.
    GamesClear,

    /// Insert or replace an archived season summary.
    SeasonPut(SeasonSummary),
    /// Delete an archived season summary.
    SeasonDelete {
        /// Key being deleted.
        id: SeasonId,
    },
    /// Drop the seasons collection.
    SeasonsClear,

    /// Insert or replace an archived stat row.
    StatPut(PlayerSeasonStat),
    /// Delete an archived stat row.
    StatDelete {
        /// Key being deleted.
        key: StatKey,
    },
    /// Drop the stat-rows collection.
    StatsClear,

    /// Insert or replace a draft pick.
    PickPut(DraftPick),
    /// Delete a draft pick.
    PickDelete {
        /// Key being deleted.
        id: PickId,
    },
    /// Drop the draft-picks collection.
    PicksClear,

    /// Atomic group of mutations from one bulk operation. Nesting is one
    /// level deep; a batch never contains another batch.
    Batch(Vec<WalEntryKind>),

    /// Checkpoint marker: everything at or before `up_to_sequence` has been
    /// compacted into a segment.
    Checkpoint {
        /// Highest sequence covered by the checkpoint.
        up_to_sequence: u64,
    },
}

/// Write-Ahead Log for crash recovery.
///
/// Thread-safe via internal mutex.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    current_sequence: Mutex<u64>,
    sync_on_write: bool,
}

impl WriteAheadLog {
    /// Open or create a WAL file.
    ///
    /// If the file exists, reads the last sequence number. If not, creates
    /// it with the header.
    pub fn open(path: &Path, sync_on_write: bool) -> IoResult<Self> {
        let exists = path.exists();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let current_sequence = if exists && file.metadata()?.len() >= 5 {
            Self::find_last_sequence(path)?
        } else {
            let mut file = file;
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
            0
        };

        // Reopen for appending
        let file = OpenOptions::new().append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
            current_sequence: Mutex::new(current_sequence),
            sync_on_write,
        })
    }

    /// Append an entry, returning the sequence number assigned to it.
    pub fn append(&self, kind: WalEntryKind) -> IoResult<u64> {
        let mut writer = self.writer.lock().unwrap();
        let mut seq_guard = self.current_sequence.lock().unwrap();

        let candidate = *seq_guard + 1;
        let entry = WalEntry {
            sequence: candidate,
            timestamp: Utc::now(),
            kind,
        };

        let encoded = codec::encode(&entry)?;

        writer.write_all(&encoded)?;
        writer.flush()?;

        if self.sync_on_write {
            writer.get_ref().sync_all()?;
        }

        *seq_guard = candidate;

        Ok(candidate)
    }

    /// Iterate over all entries, oldest first. Used during recovery.
    pub fn iter(&self) -> IoResult<WalIterator> {
        WalIterator::new(&self.path)
    }

    /// The current sequence number.
    pub fn current_sequence(&self) -> u64 {
        *self.current_sequence.lock().unwrap()
    }

    /// The WAL file size in bytes.
    pub fn size_bytes(&self) -> IoResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Truncate the WAL after a checkpoint (compaction).
    ///
    /// # Safety
    /// Only call this after the checkpointed segment is durable.
    pub fn truncate(&self) -> IoResult<()> {
        {
            // Flush pending writes, then drop the existing writer to release
            // its handle on the WAL file.
            let mut writer = self.writer.lock().unwrap();
            writer.flush()?;
            let placeholder_path = self.path.with_extension("wal.tmp");
            let placeholder = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(placeholder_path)?;
            let _old = std::mem::replace(&mut *writer, BufWriter::new(placeholder));
        }

        // Truncate and rewrite the header with a fresh handle.
        {
            let mut file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)?;

            codec::write_header(&mut file)?;
            if self.sync_on_write {
                file.sync_all()?;
            }
        }

        {
            let mut seq = self.current_sequence.lock().unwrap();
            *seq = 0;
        }

        // Reopen for appending and swap the writer back in.
        let file = OpenOptions::new().append(true).open(&self.path)?;

        let mut writer = self.writer.lock().unwrap();
        *writer = BufWriter::new(file);

        Ok(())
    }

    fn find_last_sequence(path: &Path) -> IoResult<u64> {
        let mut last_seq = 0;

        for entry_result in WalIterator::new(path)? {
            match entry_result {
                Ok(entry) => last_seq = entry.sequence,
                Err(e) => {
                    // Surface corruption but continue - replay stops at the
                    // last valid entry.
                    warn!("WAL corruption detected at sequence {}: {e}", last_seq + 1);
                    break;
                }
            }
        }

        Ok(last_seq)
    }
}

/// Iterator over WAL entries.
pub struct WalIterator {
    reader: BufReader<File>,
    file_size: u64,
}

impl WalIterator {
    fn new(path: &Path) -> IoResult<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        // Skip header
        let _version = codec::read_header(&mut reader)?;

        Ok(Self { reader, file_size })
    }

    fn at_eof(&mut self) -> IoResult<bool> {
        let pos = self.reader.stream_position()?;
        Ok(pos >= self.file_size)
    }
}

impl Iterator for WalIterator {
    type Item = IoResult<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.at_eof() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(e) => return Some(Err(e)),
        }

        match codec::decode(&mut self.reader) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn team(id: u32) -> Team {
        Team {
            id: TeamId(id),
            name: format!("Team {id}"),
            abbr: format!("T{id}"),
            conference: "East".to_string(),
            division: "North".to_string(),
            record: Default::default(),
            cap_used: 0,
        }
    }

    #[test]
    fn append_and_iterate() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("test.wal");

        let wal = WriteAheadLog::open(&wal_path, false).unwrap();

        wal.append(WalEntryKind::TeamPut(team(0))).unwrap();
        wal.append(WalEntryKind::TeamDelete { id: TeamId(0) }).unwrap();

        assert_eq!(wal.current_sequence(), 2);

        // Drop and reopen to ensure the file is properly flushed.
        drop(wal);

        let wal = WriteAheadLog::open(&wal_path, false).unwrap();

        let entries: Vec<_> = wal.iter().unwrap().collect();
        assert_eq!(entries.len(), 2);

        let first = entries[0].as_ref().unwrap();
        assert_eq!(first.sequence, 1);
        assert!(matches!(first.kind, WalEntryKind::TeamPut(_)));
    }

    #[test]
    fn sequence_survives_reopen() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("persist.wal");

        {
            let wal = WriteAheadLog::open(&wal_path, true).unwrap();
            wal.append(WalEntryKind::TeamPut(team(1))).unwrap();
        }

        {
            let wal = WriteAheadLog::open(&wal_path, true).unwrap();
            assert_eq!(wal.current_sequence(), 1);

            let entries: Vec<_> = wal.iter().unwrap().collect();
            assert_eq!(entries.len(), 1);
        }
    }

    #[test]
    fn batch_entry_round_trips_as_one_unit() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("batch.wal");

        let wal = WriteAheadLog::open(&wal_path, false).unwrap();
        wal.append(WalEntryKind::Batch(vec![
            WalEntryKind::TeamPut(team(0)),
            WalEntryKind::TeamPut(team(1)),
        ]))
        .unwrap();
        drop(wal);

        let wal = WriteAheadLog::open(&wal_path, false).unwrap();
        let entries: Vec<_> = wal.iter().unwrap().map(Result::unwrap).collect();
        assert_eq!(entries.len(), 1);

        let WalEntryKind::Batch(inner) = &entries[0].kind else {
            panic!("expected batch entry");
        };
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn truncate_resets_the_log() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("trunc.wal");

        let wal = WriteAheadLog::open(&wal_path, false).unwrap();
        wal.append(WalEntryKind::TeamPut(team(0))).unwrap();
        wal.truncate().unwrap();

        assert_eq!(wal.current_sequence(), 0);
        assert_eq!(wal.iter().unwrap().count(), 0);

        // The log accepts appends again after truncation.
        wal.append(WalEntryKind::TeamPut(team(1))).unwrap();
        assert_eq!(wal.current_sequence(), 1);
    }
}
