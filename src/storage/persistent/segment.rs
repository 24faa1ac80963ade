//! Segmented storage for checkpointed league state.
//!
//! Segments are immutable files containing compacted data from the WAL: the
//! full league state as of a checkpoint. Reads on open come from the newest
//! data across segments; the WAL supplies everything after the last
//! checkpoint.
//!
//! # Design
//! - Segments are numbered sequentially (`segment_00001.seg`, …)
//! - Each segment contains a header and one codec-framed data block
//! - Compaction writes a new segment via write-temp-then-rename

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Result as IoResult, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::{DraftPick, PickId};
use crate::game::{GameId, GameRecord};
use crate::meta::LeagueMeta;
use crate::player::{Player, PlayerId};
use crate::season::{SeasonId, SeasonSummary};
use crate::stats::{PlayerSeasonStat, StatKey};
use crate::team::{Team, TeamId};

use super::codec;

/// A single segment file.
#[derive(Debug)]
pub struct Segment {
    path: PathBuf,
    /// Sequence range covered by this segment [inclusive, inclusive].
    pub sequence_range: (u64, u64),
}

impl Segment {
    /// Open an existing segment.
    pub fn open(path: &Path) -> IoResult<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let _version = codec::read_header(&mut reader)?;
        let header: SegmentHeader = codec::decode(&mut reader)?;

        Ok(Self {
            path: path.to_path_buf(),
            sequence_range: (header.sequence_start, header.sequence_end),
        })
    }

    /// Path of this segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full data block.
    pub fn read_all(&self) -> IoResult<SegmentData> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        let _version = codec::read_header(&mut reader)?;
        let _header: SegmentHeader = codec::decode(&mut reader)?;
        let data: SegmentData = codec::decode(&mut reader)?;

        Ok(data)
    }
}

/// Segment file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHeader {
    /// First sequence number covered.
    pub sequence_start: u64,
    /// Last sequence number covered.
    pub sequence_end: u64,
    /// Number of records in the data block.
    pub entry_count: u64,
    /// When this segment was written.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Whole-league snapshot stored inside a segment, one map per collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentData {
    /// League metadata singleton.
    pub meta: Option<LeagueMeta>,
    /// Teams by id.
    pub teams: HashMap<TeamId, Team>,
    /// Players by id.
    pub players: HashMap<PlayerId, Player>,
    /// Games by composite key.
    pub games: HashMap<GameId, GameRecord>,
    /// Archived seasons by id.
    pub seasons: HashMap<SeasonId, SeasonSummary>,
    /// Archived stat rows by key.
    pub player_stats: HashMap<StatKey, PlayerSeasonStat>,
    /// Draft picks by id.
    pub draft_picks: HashMap<PickId, DraftPick>,
}

impl SegmentData {
    /// Total record count across collections.
    pub fn entry_count(&self) -> u64 {
        (usize::from(self.meta.is_some())
            + self.teams.len()
            + self.players.len()
            + self.games.len()
            + self.seasons.len()
            + self.player_stats.len()
            + self.draft_picks.len()) as u64
    }

    /// Overlay `newer` on top of this data; newer records win per key.
    fn merge(&mut self, newer: Self) {
        if newer.meta.is_some() {
            self.meta = newer.meta;
        }
        self.teams.extend(newer.teams);
        self.players.extend(newer.players);
        self.games.extend(newer.games);
        self.seasons.extend(newer.seasons);
        self.player_stats.extend(newer.player_stats);
        self.draft_picks.extend(newer.draft_picks);
    }
}

/// Builder for creating segment files atomically.
///
/// Writes to a temporary file, then renames on finalize; the rename is the
/// commit point.
pub struct SegmentWriter {
    temp_path: Option<PathBuf>,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
    sequence_start: u64,
    sequence_end: u64,
    data_written: bool,
}

impl SegmentWriter {
    /// Create a new segment writer targeting `final_path`.
    pub fn new(final_path: PathBuf, sequence_start: u64) -> IoResult<Self> {
        let temp_path = final_path.with_extension(format!("seg.tmp.{}", Uuid::new_v4()));

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(file);
        codec::write_header(&mut writer)?;

        Ok(Self {
            temp_path: Some(temp_path),
            final_path,
            writer: Some(writer),
            sequence_start,
            sequence_end: sequence_start,
            data_written: false,
        })
    }

    /// Write the data block. May only be called once.
    pub fn write_data(&mut self, data: &SegmentData, sequence_end: u64) -> IoResult<()> {
        if self.data_written {
            return Err(std::io::Error::other("write_data can only be called once"));
        }
        self.sequence_end = sequence_end;

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("writer already consumed"))?;

        let header = SegmentHeader {
            sequence_start: self.sequence_start,
            sequence_end: self.sequence_end,
            entry_count: data.entry_count(),
            created_at: Utc::now(),
        };

        let header_bytes = codec::encode(&header)?;
        writer.write_all(&header_bytes)?;

        let data_bytes = codec::encode(data)?;
        writer.write_all(&data_bytes)?;
        self.data_written = true;

        Ok(())
    }

    /// Finalize the segment (flush, fsync, rename).
    ///
    /// After this returns successfully the segment is durable.
    pub fn finalize(mut self) -> IoResult<Segment> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| std::io::Error::other("writer already consumed"))?;
        let temp_path = self
            .temp_path
            .take()
            .ok_or_else(|| std::io::Error::other("temp_path already consumed"))?;

        writer.flush()?;
        writer.get_ref().sync_all()?;

        let final_path = self.final_path.clone();
        fs::rename(&temp_path, &final_path)?;

        Ok(Segment {
            path: final_path,
            sequence_range: (self.sequence_start, self.sequence_end),
        })
    }

    /// Abort the write, removing the temp file.
    pub fn abort(mut self) -> IoResult<()> {
        self.writer.take();
        if let Some(ref temp_path) = self.temp_path {
            if temp_path.exists() {
                fs::remove_file(temp_path)?;
            }
        }
        Ok(())
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        // Best-effort cleanup of the temp file if never finalized.
        if let Some(ref temp_path) = self.temp_path {
            if temp_path.exists() {
                let _ = fs::remove_file(temp_path);
            }
        }
    }
}

/// Manages the segment files of one save directory.
#[derive(Debug)]
pub struct SegmentManager {
    dir: PathBuf,
    segments: Vec<Segment>,
    next_segment_id: u32,
}

impl SegmentManager {
    /// Open or create a segment manager for the given directory.
    pub fn open(dir: &Path) -> IoResult<Self> {
        fs::create_dir_all(dir)?;

        let mut segments = Vec::new();
        let mut next_segment_id = 1u32;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|e| e == "seg") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(id) = stem.strip_prefix("segment_").unwrap_or("").parse::<u32>() {
                        next_segment_id = next_segment_id.max(id + 1);

                        match Segment::open(&path) {
                            Ok(seg) => segments.push(seg),
                            Err(e) => warn!("failed to open segment {path:?}: {e}"),
                        }
                    }
                }
            }

            // Clean up any stale temp files from an interrupted compaction.
            let is_temp = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().contains(".seg.tmp."));
            if is_temp {
                let _ = fs::remove_file(&path);
            }
        }

        segments.sort_by_key(|s| s.sequence_range.0);

        Ok(Self {
            dir: dir.to_path_buf(),
            segments,
            next_segment_id,
        })
    }

    /// Segments ordered by sequence.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Highest sequence number covered by any segment.
    pub fn persisted_sequence(&self) -> u64 {
        self.segments.last().map_or(0, |s| s.sequence_range.1)
    }

    /// Create a writer for the next segment file.
    pub fn create_segment_writer(&mut self, sequence_start: u64) -> IoResult<SegmentWriter> {
        let name = format!("segment_{:05}.seg", self.next_segment_id);
        self.next_segment_id += 1;
        SegmentWriter::new(self.dir.join(name), sequence_start)
    }

    /// Register a newly finalized segment.
    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.segments.sort_by_key(|s| s.sequence_range.0);
    }

    /// Remove every segment older than the newest one. Called after a
    /// compaction wrote a full snapshot, which supersedes all prior segments.
    pub fn drop_superseded(&mut self) -> IoResult<()> {
        while self.segments.len() > 1 {
            let old = self.segments.remove(0);
            fs::remove_file(old.path())?;
        }
        Ok(())
    }

    /// Merge all segment data, newest last so it wins per key.
    pub fn load_all_data(&self) -> IoResult<SegmentData> {
        let mut combined = SegmentData::default();

        for segment in &self.segments {
            let data = segment.read_all()?;
            combined.merge(data);
        }

        Ok(combined)
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
    fn open_empty_directory() {
        let dir = tempdir().unwrap();
        let manager = SegmentManager::open(dir.path()).unwrap();

        assert!(manager.segments().is_empty());
        assert_eq!(manager.persisted_sequence(), 0);
    }

    #[test]
    fn writer_roundtrip() {
        let dir = tempdir().unwrap();
        let mut manager = SegmentManager::open(dir.path()).unwrap();

        let mut data = SegmentData::default();
        let t = team(0);
        data.teams.insert(t.id, t.clone());

        let mut writer = manager.create_segment_writer(1).unwrap();
        writer.write_data(&data, 10).unwrap();
        let segment = writer.finalize().unwrap();

        assert_eq!(segment.sequence_range, (1, 10));

        let read_data = segment.read_all().unwrap();
        assert_eq!(read_data.teams.len(), 1);
        assert!(read_data.teams.contains_key(&t.id));
    }

    #[test]
    fn writer_abort_removes_temp_file() {
        let dir = tempdir().unwrap();
        let mut manager = SegmentManager::open(dir.path()).unwrap();

        let writer = manager.create_segment_writer(1).unwrap();
        let temp_path = writer.temp_path.clone().unwrap();

        writer.abort().unwrap();

        assert!(!temp_path.exists());
    }

    #[test]
    fn newest_segment_wins_per_key() {
        let dir = tempdir().unwrap();
        let mut manager = SegmentManager::open(dir.path()).unwrap();

        let mut older = SegmentData::default();
        let mut stale = team(0);
        stale.name = "Stale Name".to_string();
        older.teams.insert(stale.id, stale);

        let mut writer = manager.create_segment_writer(1).unwrap();
        writer.write_data(&older, 5).unwrap();
        manager.add_segment(writer.finalize().unwrap());

        let mut newer = SegmentData::default();
        let fresh = team(0);
        newer.teams.insert(fresh.id, fresh.clone());

        let mut writer = manager.create_segment_writer(6).unwrap();
        writer.write_data(&newer, 9).unwrap();
        manager.add_segment(writer.finalize().unwrap());

        let combined = manager.load_all_data().unwrap();
        assert_eq!(combined.teams[&fresh.id].name, fresh.name);
    }

    #[test]
    fn drop_superseded_keeps_only_the_newest() {
        let dir = tempdir().unwrap();
        let mut manager = SegmentManager::open(dir.path()).unwrap();

        for seq in [1u64, 6, 11] {
            let mut writer = manager.create_segment_writer(seq).unwrap();
            writer.write_data(&SegmentData::default(), seq + 4).unwrap();
            manager.add_segment(writer.finalize().unwrap());
        }

        manager.drop_superseded().unwrap();
        assert_eq!(manager.segments().len(), 1);
        assert_eq!(manager.persisted_sequence(), 15);
    }
}
