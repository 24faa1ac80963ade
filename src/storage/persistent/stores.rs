//! Persistent store implementations.
//!
//! Each collection wraps:
//! - An in-memory mirror for fast reads
//! - WAL integration for durable writes
//! - Segment files for compacted long-term state
//!
//! Writes append to the WAL before touching the mirror, so a crash between
//! the two replays cleanly. Bulk writes append a single `Batch` entry, which
//! is what makes `put_bulk` all-or-nothing.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{info, warn};

use crate::draft::{DraftPick, PickId};
use crate::game::{GameId, GameRecord};
use crate::meta::LeagueMeta;
use crate::player::{Player, PlayerId, Position};
use crate::season::{SeasonId, SeasonSummary};
use crate::stats::{PlayerSeasonStat, StatKey};
use crate::storage::traits::{
    DraftPickStore, GameStore, MetaStore, PlayerStatStore, PlayerStore, SeasonStore, StoreHandles,
    StorageError, TeamStore,
};
use crate::team::{Team, TeamId};

use super::file_lock::FileLock;
use super::segment::{SegmentData, SegmentManager};
use super::wal::{WalEntryKind, WriteAheadLog};
use super::PersistentConfig;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

fn wal_err(e: std::io::Error) -> StorageError {
    StorageError::Backend(format!("WAL write failed: {e}"))
}

/// Aggregate type owning every persistent collection of one save directory.
///
/// This is the primary entry point for persistent storage.
pub struct PersistentStores {
    /// The save directory.
    pub dir: PathBuf,
    _lock: FileLock,
    wal: Arc<WriteAheadLog>,
    segments: Arc<RwLock<SegmentManager>>,
    config: PersistentConfig,

    meta: PersistentMetaStore,
    teams: PersistentTeamStore,
    players: PersistentPlayerStore,
    games: PersistentGameStore,
    seasons: PersistentSeasonStore,
    player_stats: PersistentPlayerStatStore,
    draft_picks: PersistentDraftPickStore,
}

impl std::fmt::Debug for PersistentStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStores")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl PersistentStores {
    /// Open or create a persistent save.
    pub fn open(dir: &Path, config: PersistentConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)
            .map_err(|e| StorageError::Backend(format!("failed to create save directory: {e}")))?;

        let lock = FileLock::acquire(dir).map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock {
                StorageError::Locked(e.to_string())
            } else {
                StorageError::Backend(format!("failed to acquire lock: {e}"))
            }
        })?;

        let wal_path = dir.join("league.wal");
        let wal = Arc::new(
            WriteAheadLog::open(&wal_path, config.sync_on_write)
                .map_err(|e| StorageError::Backend(format!("failed to open WAL: {e}")))?,
        );

        let segments_dir = dir.join("segments");
        let segments = Arc::new(RwLock::new(SegmentManager::open(&segments_dir).map_err(
            |e| StorageError::Backend(format!("failed to open segments: {e}")),
        )?));

        let stores = Self {
            dir: dir.to_path_buf(),
            _lock: lock,
            wal: Arc::clone(&wal),
            segments,
            config,
            meta: PersistentMetaStore::new(Arc::clone(&wal)),
            teams: PersistentTeamStore::new(Arc::clone(&wal)),
            players: PersistentPlayerStore::new(Arc::clone(&wal)),
            games: PersistentGameStore::new(Arc::clone(&wal)),
            seasons: PersistentSeasonStore::new(Arc::clone(&wal)),
            player_stats: PersistentPlayerStatStore::new(Arc::clone(&wal)),
            draft_picks: PersistentDraftPickStore::new(wal),
        };

        // Compacted data first, then the WAL tail on top.
        stores.load_segments()?;
        stores.replay_wal()?;

        // Recovery is the natural compaction point: a long WAL means the last
        // session never checkpointed.
        if stores.wal_size() > stores.config.max_wal_size {
            stores.compact()?;
        }

        Ok(stores)
    }

    /// Wrap the collections in shared handles for the Command Router.
    ///
    /// The handles share state with this value but not the directory lock:
    /// keep the `PersistentStores` alive for as long as the save is in use.
    #[must_use]
    pub fn handles(&self) -> StoreHandles {
        StoreHandles {
            meta: Arc::new(self.meta.clone()),
            teams: Arc::new(self.teams.clone()),
            players: Arc::new(self.players.clone()),
            games: Arc::new(self.games.clone()),
            seasons: Arc::new(self.seasons.clone()),
            player_stats: Arc::new(self.player_stats.clone()),
            draft_picks: Arc::new(self.draft_picks.clone()),
        }
    }

    fn load_segments(&self) -> Result<(), StorageError> {
        let segments = self.segments.read().map_err(|_| lock_err("segments.load"))?;

        if segments.segments().is_empty() {
            return Ok(());
        }

        let data = segments
            .load_all_data()
            .map_err(|e| StorageError::Corrupted(format!("failed to load segment data: {e}")))?;
        drop(segments);

        *self.meta.index.write().map_err(|_| lock_err("meta.seed"))? = data.meta;
        *self.teams.index.write().map_err(|_| lock_err("teams.seed"))? = data.teams;
        *self.players.index.write().map_err(|_| lock_err("players.seed"))? = data.players;
        *self.games.index.write().map_err(|_| lock_err("games.seed"))? = data.games;
        *self.seasons.index.write().map_err(|_| lock_err("seasons.seed"))? = data.seasons;
        *self
            .player_stats
            .index
            .write()
            .map_err(|_| lock_err("player_stats.seed"))? = data.player_stats;
        *self
            .draft_picks
            .index
            .write()
            .map_err(|_| lock_err("draft_picks.seed"))? = data.draft_picks;

        Ok(())
    }

    fn replay_wal(&self) -> Result<(), StorageError> {
        let iter = self
            .wal
            .iter()
            .map_err(|e| StorageError::Backend(format!("failed to iterate WAL: {e}")))?;

        let mut count = 0u64;
        for entry_result in iter {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    // A torn tail is expected after a crash; everything up to
                    // it has already been applied.
                    warn!("WAL replay stopped at a corrupted entry: {e}");
                    break;
                }
            };

            self.apply_entry(&entry.kind)?;
            count += 1;
        }

        if count > 0 {
            info!("replayed {count} WAL entries");
        }

        Ok(())
    }

    fn apply_entry(&self, kind: &WalEntryKind) -> Result<(), StorageError> {
        match kind {
            WalEntryKind::MetaPut(meta) => {
                *self.meta.index.write().map_err(|_| lock_err("meta.replay"))? =
                    Some(meta.clone());
            }
            WalEntryKind::MetaClear => {
                *self.meta.index.write().map_err(|_| lock_err("meta.replay"))? = None;
            }
            WalEntryKind::TeamPut(team) => {
                self.teams
                    .index
                    .write()
                    .map_err(|_| lock_err("teams.replay"))?
                    .insert(team.id, team.clone());
            }
            WalEntryKind::TeamDelete { id } => {
                self.teams
                    .index
                    .write()
                    .map_err(|_| lock_err("teams.replay"))?
                    .remove(id);
            }
            WalEntryKind::TeamsClear => {
                self.teams
                    .index
                    .write()
                    .map_err(|_| lock_err("teams.replay"))?
                    .clear();
            }
            WalEntryKind::PlayerPut(player) => {
                self.players
                    .index
                    .write()
                    .map_err(|_| lock_err("players.replay"))?
                    .insert(player.id, player.clone());
            }
            WalEntryKind::PlayerDelete { id } => {
                self.players
                    .index
                    .write()
                    .map_err(|_| lock_err("players.replay"))?
                    .remove(id);
            }
            WalEntryKind::PlayersClear => {
                self.players
                    .index
                    .write()
                    .map_err(|_| lock_err("players.replay"))?
                    .clear();
            }
            WalEntryKind::GamePut(game) => {
                self.games
                    .index
                    .write()
                    .map_err(|_| lock_err("games.replay"))?
                    .insert(game.id, game.clone());
            }
            WalEntryKind::GameDelete { id } => {
                self.games
                    .index
                    .write()
                    .map_err(|_| lock_err("games.replay"))?
                    .remove(id);
            }
            WalEntryKind::GamesClear => {
                self.games
                    .index
                    .write()
                    .map_err(|_| lock_err("games.replay"))?
                    .clear();
            }
            WalEntryKind::SeasonPut(season) => {
                self.seasons
                    .index
                    .write()
                    .map_err(|_| lock_err("seasons.replay"))?
                    .insert(season.season, season.clone());
            }
            WalEntryKind::SeasonDelete { id } => {
                self.seasons
                    .index
                    .write()
                    .map_err(|_| lock_err("seasons.replay"))?
                    .remove(id);
            }
            WalEntryKind::SeasonsClear => {
                self.seasons
                    .index
                    .write()
                    .map_err(|_| lock_err("seasons.replay"))?
                    .clear();
            }
            WalEntryKind::StatPut(row) => {
                self.player_stats
                    .index
                    .write()
                    .map_err(|_| lock_err("player_stats.replay"))?
                    .insert(row.key, row.clone());
            }
            WalEntryKind::StatDelete { key } => {
                self.player_stats
                    .index
                    .write()
                    .map_err(|_| lock_err("player_stats.replay"))?
                    .remove(key);
            }
            WalEntryKind::StatsClear => {
                self.player_stats
                    .index
                    .write()
                    .map_err(|_| lock_err("player_stats.replay"))?
                    .clear();
            }
            WalEntryKind::PickPut(pick) => {
                self.draft_picks
                    .index
                    .write()
                    .map_err(|_| lock_err("draft_picks.replay"))?
                    .insert(pick.id, pick.clone());
            }
            WalEntryKind::PickDelete { id } => {
                self.draft_picks
                    .index
                    .write()
                    .map_err(|_| lock_err("draft_picks.replay"))?
                    .remove(id);
            }
            WalEntryKind::PicksClear => {
                self.draft_picks
                    .index
                    .write()
                    .map_err(|_| lock_err("draft_picks.replay"))?
                    .clear();
            }
            WalEntryKind::Batch(entries) => {
                for inner in entries {
                    self.apply_entry(inner)?;
                }
            }
            WalEntryKind::Checkpoint { .. } => {
                // Informational during replay.
            }
        }
        Ok(())
    }

    /// Compact the WAL into a fresh segment file.
    ///
    /// 1. Snapshots all in-memory state
    /// 2. Writes it atomically to a new segment
    /// 3. Drops superseded segments, checkpoints and truncates the WAL
    ///
    /// Safe to call at any time: if it fails partway through, the WAL still
    /// contains all data and replays on next open.
    pub fn compact(&self) -> Result<CompactionResult, StorageError> {
        let current_seq = self.wal.current_sequence();
        if current_seq == 0 {
            return Ok(CompactionResult {
                entries_compacted: 0,
                segment_path: None,
                wal_size_before: 0,
                wal_size_after: 0,
            });
        }

        let wal_size_before = self.wal_size();

        let data = SegmentData {
            meta: self.meta.index.read().map_err(|_| lock_err("meta.compact"))?.clone(),
            teams: self.teams.index.read().map_err(|_| lock_err("teams.compact"))?.clone(),
            players: self
                .players
                .index
                .read()
                .map_err(|_| lock_err("players.compact"))?
                .clone(),
            games: self.games.index.read().map_err(|_| lock_err("games.compact"))?.clone(),
            seasons: self
                .seasons
                .index
                .read()
                .map_err(|_| lock_err("seasons.compact"))?
                .clone(),
            player_stats: self
                .player_stats
                .index
                .read()
                .map_err(|_| lock_err("player_stats.compact"))?
                .clone(),
            draft_picks: self
                .draft_picks
                .index
                .read()
                .map_err(|_| lock_err("draft_picks.compact"))?
                .clone(),
        };

        let entry_count = data.entry_count();

        let mut segments = self.segments.write().map_err(|_| lock_err("segments.compact"))?;
        let persisted_seq = segments.persisted_sequence();

        let mut writer = segments
            .create_segment_writer(persisted_seq + 1)
            .map_err(|e| StorageError::Backend(format!("failed to create segment writer: {e}")))?;

        if let Err(e) = writer.write_data(&data, current_seq) {
            let _ = writer.abort();
            return Err(StorageError::Backend(format!(
                "failed to write segment data: {e}"
            )));
        }

        let segment = writer
            .finalize()
            .map_err(|e| StorageError::Backend(format!("failed to finalize segment: {e}")))?;

        let segment_path = segment.path().to_path_buf();
        segments.add_segment(segment);
        segments
            .drop_superseded()
            .map_err(|e| StorageError::Backend(format!("failed to drop old segments: {e}")))?;
        drop(segments);

        self.wal
            .append(WalEntryKind::Checkpoint {
                up_to_sequence: current_seq,
            })
            .map_err(wal_err)?;

        self.wal
            .truncate()
            .map_err(|e| StorageError::Backend(format!("failed to truncate WAL: {e}")))?;

        let wal_size_after = self.wal_size();
        info!(
            "compacted {entry_count} records into {segment_path:?} (WAL {wal_size_before} -> {wal_size_after} bytes)"
        );

        Ok(CompactionResult {
            entries_compacted: entry_count,
            segment_path: Some(segment_path),
            wal_size_before,
            wal_size_after,
        })
    }

    /// Current WAL size in bytes.
    pub fn wal_size(&self) -> u64 {
        self.wal.size_bytes().unwrap_or(0)
    }

    /// Number of segment files on disk.
    pub fn segment_count(&self) -> usize {
        self.segments.read().map(|s| s.segments().len()).unwrap_or(0)
    }
}

/// Result of a compaction operation.
#[derive(Debug, Clone)]
pub struct CompactionResult {
    /// Number of records written into the segment.
    pub entries_compacted: u64,
    /// Path of the new segment file, if one was created.
    pub segment_path: Option<PathBuf>,
    /// WAL size before compaction.
    pub wal_size_before: u64,
    /// WAL size after compaction.
    pub wal_size_after: u64,
}

// --- Meta ---

/// Persistent metadata singleton.
#[derive(Clone)]
pub struct PersistentMetaStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<Option<LeagueMeta>>>,
}

impl PersistentMetaStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(None)),
        }
    }
}

impl MetaStore for PersistentMetaStore {
    fn load(&self) -> Result<Option<LeagueMeta>, StorageError> {
        Ok(self.index.read().map_err(|_| lock_err("meta.load"))?.clone())
    }

    fn save(&self, meta: &LeagueMeta) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("meta.save"))?;
        self.wal
            .append(WalEntryKind::MetaPut(meta.clone()))
            .map_err(wal_err)?;
        *index = Some(meta.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("meta.clear"))?;
        if index.is_none() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::MetaClear).map_err(wal_err)?;
        *index = None;
        Ok(())
    }
}

// --- Teams ---

/// Persistent teams collection.
#[derive(Clone)]
pub struct PersistentTeamStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<HashMap<TeamId, Team>>>,
}

impl PersistentTeamStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl TeamStore for PersistentTeamStore {
    fn get(&self, id: TeamId) -> Result<Option<Team>, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(|_| lock_err("teams.get"))?
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<Team>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("teams.get_all"))?;
        let mut teams: Vec<Team> = index.values().cloned().collect();
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    fn put(&self, team: &Team) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("teams.put"))?;
        self.wal
            .append(WalEntryKind::TeamPut(team.clone()))
            .map_err(wal_err)?;
        index.insert(team.id, team.clone());
        Ok(())
    }

    fn put_bulk(&self, teams: &[Team]) -> Result<(), StorageError> {
        if teams.is_empty() {
            return Ok(());
        }
        let mut index = self.index.write().map_err(|_| lock_err("teams.put_bulk"))?;
        let batch = teams
            .iter()
            .map(|t| WalEntryKind::TeamPut(t.clone()))
            .collect();
        self.wal.append(WalEntryKind::Batch(batch)).map_err(wal_err)?;
        for team in teams {
            index.insert(team.id, team.clone());
        }
        Ok(())
    }

    fn delete(&self, id: TeamId) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("teams.delete"))?;
        if !index.contains_key(&id) {
            return Ok(());
        }
        self.wal
            .append(WalEntryKind::TeamDelete { id })
            .map_err(wal_err)?;
        index.remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("teams.clear"))?;
        if index.is_empty() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::TeamsClear).map_err(wal_err)?;
        index.clear();
        Ok(())
    }
}

// --- Players ---

/// Persistent players collection. The team/position indexes are filters over
/// the in-memory mirror.
#[derive(Clone)]
pub struct PersistentPlayerStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<HashMap<PlayerId, Player>>>,
}

impl PersistentPlayerStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn filtered(&self, pred: impl Fn(&Player) -> bool) -> Result<Vec<Player>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("players.filter"))?;
        let mut players: Vec<Player> = index.values().filter(|p| pred(p)).cloned().collect();
        players.sort_by_key(|p| p.id);
        Ok(players)
    }
}

impl PlayerStore for PersistentPlayerStore {
    fn get(&self, id: PlayerId) -> Result<Option<Player>, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(|_| lock_err("players.get"))?
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<Player>, StorageError> {
        self.filtered(|_| true)
    }

    fn by_team(&self, team: TeamId) -> Result<Vec<Player>, StorageError> {
        self.filtered(|p| p.team_id == Some(team))
    }

    fn by_position(&self, pos: Position) -> Result<Vec<Player>, StorageError> {
        self.filtered(|p| p.pos == pos)
    }

    fn put(&self, player: &Player) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("players.put"))?;
        self.wal
            .append(WalEntryKind::PlayerPut(player.clone()))
            .map_err(wal_err)?;
        index.insert(player.id, player.clone());
        Ok(())
    }

    fn put_bulk(&self, players: &[Player]) -> Result<(), StorageError> {
        if players.is_empty() {
            return Ok(());
        }
        let mut index = self.index.write().map_err(|_| lock_err("players.put_bulk"))?;
        let batch = players
            .iter()
            .map(|p| WalEntryKind::PlayerPut(p.clone()))
            .collect();
        self.wal.append(WalEntryKind::Batch(batch)).map_err(wal_err)?;
        for player in players {
            index.insert(player.id, player.clone());
        }
        Ok(())
    }

    fn delete(&self, id: PlayerId) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("players.delete"))?;
        if !index.contains_key(&id) {
            return Ok(());
        }
        self.wal
            .append(WalEntryKind::PlayerDelete { id })
            .map_err(wal_err)?;
        index.remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("players.clear"))?;
        if index.is_empty() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::PlayersClear).map_err(wal_err)?;
        index.clear();
        Ok(())
    }
}

// --- Games ---

/// Persistent games collection.
#[derive(Clone)]
pub struct PersistentGameStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<HashMap<GameId, GameRecord>>>,
}

impl PersistentGameStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn filtered(&self, pred: impl Fn(&GameRecord) -> bool) -> Result<Vec<GameRecord>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("games.filter"))?;
        let mut games: Vec<GameRecord> = index.values().filter(|g| pred(g)).cloned().collect();
        games.sort_by_key(|g| g.id);
        Ok(games)
    }
}

impl GameStore for PersistentGameStore {
    fn get(&self, id: GameId) -> Result<Option<GameRecord>, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(|_| lock_err("games.get"))?
            .get(&id)
            .cloned())
    }

    fn by_season(&self, season: SeasonId) -> Result<Vec<GameRecord>, StorageError> {
        self.filtered(|g| g.id.season == season)
    }

    fn by_week(&self, season: SeasonId, week: u32) -> Result<Vec<GameRecord>, StorageError> {
        self.filtered(|g| g.id.season == season && g.id.week == week)
    }

    fn put(&self, game: &GameRecord) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("games.put"))?;
        self.wal
            .append(WalEntryKind::GamePut(game.clone()))
            .map_err(wal_err)?;
        index.insert(game.id, game.clone());
        Ok(())
    }

    fn put_bulk(&self, games: &[GameRecord]) -> Result<(), StorageError> {
        if games.is_empty() {
            return Ok(());
        }
        let mut index = self.index.write().map_err(|_| lock_err("games.put_bulk"))?;
        let batch = games
            .iter()
            .map(|g| WalEntryKind::GamePut(g.clone()))
            .collect();
        self.wal.append(WalEntryKind::Batch(batch)).map_err(wal_err)?;
        for game in games {
            index.insert(game.id, game.clone());
        }
        Ok(())
    }

    fn delete(&self, id: GameId) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("games.delete"))?;
        if !index.contains_key(&id) {
            return Ok(());
        }
        self.wal
            .append(WalEntryKind::GameDelete { id })
            .map_err(wal_err)?;
        index.remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("games.clear"))?;
        if index.is_empty() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::GamesClear).map_err(wal_err)?;
        index.clear();
        Ok(())
    }
}

// --- Seasons ---

/// Persistent archived seasons collection.
#[derive(Clone)]
pub struct PersistentSeasonStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<HashMap<SeasonId, SeasonSummary>>>,
}

impl PersistentSeasonStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl SeasonStore for PersistentSeasonStore {
    fn get(&self, id: SeasonId) -> Result<Option<SeasonSummary>, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(|_| lock_err("seasons.get"))?
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<SeasonSummary>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("seasons.get_all"))?;
        let mut seasons: Vec<SeasonSummary> = index.values().cloned().collect();
        seasons.sort_by_key(|s| s.season);
        Ok(seasons)
    }

    fn by_year(&self, year: u32) -> Result<Vec<SeasonSummary>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("seasons.by_year"))?;
        let mut seasons: Vec<SeasonSummary> =
            index.values().filter(|s| s.year == year).cloned().collect();
        seasons.sort_by_key(|s| s.season);
        Ok(seasons)
    }

    fn put(&self, season: &SeasonSummary) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("seasons.put"))?;
        self.wal
            .append(WalEntryKind::SeasonPut(season.clone()))
            .map_err(wal_err)?;
        index.insert(season.season, season.clone());
        Ok(())
    }

    fn delete(&self, id: SeasonId) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("seasons.delete"))?;
        if !index.contains_key(&id) {
            return Ok(());
        }
        self.wal
            .append(WalEntryKind::SeasonDelete { id })
            .map_err(wal_err)?;
        index.remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("seasons.clear"))?;
        if index.is_empty() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::SeasonsClear).map_err(wal_err)?;
        index.clear();
        Ok(())
    }
}

// --- Player stats ---

/// Persistent archived stat rows.
#[derive(Clone)]
pub struct PersistentPlayerStatStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<HashMap<StatKey, PlayerSeasonStat>>>,
}

impl PersistentPlayerStatStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn filtered(
        &self,
        pred: impl Fn(&PlayerSeasonStat) -> bool,
    ) -> Result<Vec<PlayerSeasonStat>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("player_stats.filter"))?;
        let mut rows: Vec<PlayerSeasonStat> = index.values().filter(|r| pred(r)).cloned().collect();
        rows.sort_by_key(|r| r.key);
        Ok(rows)
    }
}

impl PlayerStatStore for PersistentPlayerStatStore {
    fn get(&self, key: StatKey) -> Result<Option<PlayerSeasonStat>, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(|_| lock_err("player_stats.get"))?
            .get(&key)
            .cloned())
    }

    fn by_season(&self, season: SeasonId) -> Result<Vec<PlayerSeasonStat>, StorageError> {
        self.filtered(|r| r.key.season == season)
    }

    fn by_player(&self, player: PlayerId) -> Result<Vec<PlayerSeasonStat>, StorageError> {
        self.filtered(|r| r.key.player == player)
    }

    fn put(&self, row: &PlayerSeasonStat) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("player_stats.put"))?;
        self.wal
            .append(WalEntryKind::StatPut(row.clone()))
            .map_err(wal_err)?;
        index.insert(row.key, row.clone());
        Ok(())
    }

    fn put_bulk(&self, rows: &[PlayerSeasonStat]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut index = self
            .index
            .write()
            .map_err(|_| lock_err("player_stats.put_bulk"))?;
        let batch = rows
            .iter()
            .map(|r| WalEntryKind::StatPut(r.clone()))
            .collect();
        self.wal.append(WalEntryKind::Batch(batch)).map_err(wal_err)?;
        for row in rows {
            index.insert(row.key, row.clone());
        }
        Ok(())
    }

    fn delete(&self, key: StatKey) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("player_stats.delete"))?;
        if !index.contains_key(&key) {
            return Ok(());
        }
        self.wal
            .append(WalEntryKind::StatDelete { key })
            .map_err(wal_err)?;
        index.remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("player_stats.clear"))?;
        if index.is_empty() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::StatsClear).map_err(wal_err)?;
        index.clear();
        Ok(())
    }
}

// --- Draft picks ---

/// Persistent draft picks collection.
#[derive(Clone)]
pub struct PersistentDraftPickStore {
    wal: Arc<WriteAheadLog>,
    index: Arc<RwLock<HashMap<PickId, DraftPick>>>,
}

impl PersistentDraftPickStore {
    fn new(wal: Arc<WriteAheadLog>) -> Self {
        Self {
            wal,
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn filtered(&self, pred: impl Fn(&DraftPick) -> bool) -> Result<Vec<DraftPick>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("draft_picks.filter"))?;
        let mut picks: Vec<DraftPick> = index.values().filter(|p| pred(p)).cloned().collect();
        picks.sort_by_key(|p| p.id);
        Ok(picks)
    }
}

impl DraftPickStore for PersistentDraftPickStore {
    fn get(&self, id: PickId) -> Result<Option<DraftPick>, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(|_| lock_err("draft_picks.get"))?
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<DraftPick>, StorageError> {
        self.filtered(|_| true)
    }

    fn by_owner(&self, team: TeamId) -> Result<Vec<DraftPick>, StorageError> {
        self.filtered(|p| p.owner == team)
    }

    fn by_year(&self, year: u32) -> Result<Vec<DraftPick>, StorageError> {
        self.filtered(|p| p.year == year)
    }

    fn put(&self, pick: &DraftPick) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("draft_picks.put"))?;
        self.wal
            .append(WalEntryKind::PickPut(pick.clone()))
            .map_err(wal_err)?;
        index.insert(pick.id, pick.clone());
        Ok(())
    }

    fn put_bulk(&self, picks: &[DraftPick]) -> Result<(), StorageError> {
        if picks.is_empty() {
            return Ok(());
        }
        let mut index = self
            .index
            .write()
            .map_err(|_| lock_err("draft_picks.put_bulk"))?;
        let batch = picks
            .iter()
            .map(|p| WalEntryKind::PickPut(p.clone()))
            .collect();
        self.wal.append(WalEntryKind::Batch(batch)).map_err(wal_err)?;
        for pick in picks {
            index.insert(pick.id, pick.clone());
        }
        Ok(())
    }

    fn delete(&self, id: PickId) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("draft_picks.delete"))?;
        if !index.contains_key(&id) {
            return Ok(());
        }
        self.wal
            .append(WalEntryKind::PickDelete { id })
            .map_err(wal_err)?;
        index.remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut index = self.index.write().map_err(|_| lock_err("draft_picks.clear"))?;
        if index.is_empty() {
            return Ok(());
        }
        self.wal.append(WalEntryKind::PicksClear).map_err(wal_err)?;
        index.clear();
        Ok(())
    }
}
