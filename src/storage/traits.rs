//! Abstract storage traits for the Durable Store.
//!
//! These traits define the contract that storage backends must implement.
//! By using traits, we enable:
//! - In-memory backends for tests and ephemeral leagues
//! - A persistent backend for real saves
//!
//! Each collection declares its key and the secondary indexes it is read by;
//! indexes are filters only and never enforce uniqueness beyond the primary
//! key. `put_bulk` is transactionally atomic per call: either every record in
//! the slice becomes durable or none does. `delete` is idempotent; removing
//! an absent key is not an error, because flush-time deletions may race a
//! record that was never persisted.

use std::sync::Arc;

use thiserror::Error;

use crate::draft::{DraftPick, PickId};
use crate::game::{GameId, GameRecord};
use crate::meta::LeagueMeta;
use crate::player::{Player, PlayerId, Position};
use crate::season::{SeasonId, SeasonSummary};
use crate::stats::{PlayerSeasonStat, StatKey};
use crate::team::{Team, TeamId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error (I/O failure, lock poisoning, …).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// On-disk data failed integrity checks.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// Another process holds the database lock.
    #[error("database is locked: {0}")]
    Locked(String),
}

/// Storage for the singleton league metadata record.
pub trait MetaStore: Send + Sync {
    /// Load the metadata record, `None` when no save exists.
    fn load(&self) -> Result<Option<LeagueMeta>, StorageError>;

    /// Write the metadata record.
    fn save(&self, meta: &LeagueMeta) -> Result<(), StorageError>;

    /// Remove the metadata record.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage for teams, keyed by [`TeamId`].
pub trait TeamStore: Send + Sync {
    /// Get a team by id.
    fn get(&self, id: TeamId) -> Result<Option<Team>, StorageError>;

    /// Load every team.
    fn get_all(&self) -> Result<Vec<Team>, StorageError>;

    /// Insert or replace a team.
    fn put(&self, team: &Team) -> Result<(), StorageError>;

    /// Insert or replace many teams atomically.
    fn put_bulk(&self, teams: &[Team]) -> Result<(), StorageError>;

    /// Delete a team. Absent keys are ignored.
    fn delete(&self, id: TeamId) -> Result<(), StorageError>;

    /// Drop the whole collection.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage for players, keyed by [`PlayerId`], indexed by team and position.
pub trait PlayerStore: Send + Sync {
    /// Get a player by id.
    fn get(&self, id: PlayerId) -> Result<Option<Player>, StorageError>;

    /// Load every player.
    fn get_all(&self) -> Result<Vec<Player>, StorageError>;

    /// Players rostered by the given team.
    fn by_team(&self, team: TeamId) -> Result<Vec<Player>, StorageError>;

    /// Players at the given position.
    fn by_position(&self, pos: Position) -> Result<Vec<Player>, StorageError>;

    /// Insert or replace a player.
    fn put(&self, player: &Player) -> Result<(), StorageError>;

    /// Insert or replace many players atomically.
    fn put_bulk(&self, players: &[Player]) -> Result<(), StorageError>;

    /// Delete a player. Absent keys are ignored.
    fn delete(&self, id: PlayerId) -> Result<(), StorageError>;

    /// Drop the whole collection.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage for game records, keyed by [`GameId`], indexed by season and week.
pub trait GameStore: Send + Sync {
    /// Get a game by id.
    fn get(&self, id: GameId) -> Result<Option<GameRecord>, StorageError>;

    /// Every game of a season.
    fn by_season(&self, season: SeasonId) -> Result<Vec<GameRecord>, StorageError>;

    /// Every game of one week of a season.
    fn by_week(&self, season: SeasonId, week: u32) -> Result<Vec<GameRecord>, StorageError>;

    /// Insert or replace a game.
    fn put(&self, game: &GameRecord) -> Result<(), StorageError>;

    /// Insert or replace many games atomically.
    fn put_bulk(&self, games: &[GameRecord]) -> Result<(), StorageError>;

    /// Delete a game. Absent keys are ignored.
    fn delete(&self, id: GameId) -> Result<(), StorageError>;

    /// Drop the whole collection.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage for archived season summaries, keyed by [`SeasonId`], indexed by
/// year.
pub trait SeasonStore: Send + Sync {
    /// Get a season summary by id.
    fn get(&self, id: SeasonId) -> Result<Option<SeasonSummary>, StorageError>;

    /// Load every archived season.
    fn get_all(&self) -> Result<Vec<SeasonSummary>, StorageError>;

    /// Seasons played in the given calendar year.
    fn by_year(&self, year: u32) -> Result<Vec<SeasonSummary>, StorageError>;

    /// Insert or replace a season summary.
    fn put(&self, season: &SeasonSummary) -> Result<(), StorageError>;

    /// Delete a season summary. Absent keys are ignored.
    fn delete(&self, id: SeasonId) -> Result<(), StorageError>;

    /// Drop the whole collection.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage for archived per-season stat rows, keyed by [`StatKey`], indexed
/// by season and player.
pub trait PlayerStatStore: Send + Sync {
    /// Get a stat row by key.
    fn get(&self, key: StatKey) -> Result<Option<PlayerSeasonStat>, StorageError>;

    /// Every stat row for a season.
    fn by_season(&self, season: SeasonId) -> Result<Vec<PlayerSeasonStat>, StorageError>;

    /// Every stat row for a player across seasons.
    fn by_player(&self, player: PlayerId) -> Result<Vec<PlayerSeasonStat>, StorageError>;

    /// Insert or replace a stat row.
    fn put(&self, row: &PlayerSeasonStat) -> Result<(), StorageError>;

    /// Insert or replace many stat rows atomically.
    fn put_bulk(&self, rows: &[PlayerSeasonStat]) -> Result<(), StorageError>;

    /// Delete a stat row. Absent keys are ignored.
    fn delete(&self, key: StatKey) -> Result<(), StorageError>;

    /// Drop the whole collection.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage for draft picks, keyed by [`PickId`], indexed by current owner and
/// year.
pub trait DraftPickStore: Send + Sync {
    /// Get a pick by id.
    fn get(&self, id: PickId) -> Result<Option<DraftPick>, StorageError>;

    /// Load every pick.
    fn get_all(&self) -> Result<Vec<DraftPick>, StorageError>;

    /// Picks currently held by the given team.
    fn by_owner(&self, team: TeamId) -> Result<Vec<DraftPick>, StorageError>;

    /// Picks for the given draft year.
    fn by_year(&self, year: u32) -> Result<Vec<DraftPick>, StorageError>;

    /// Insert or replace a pick.
    fn put(&self, pick: &DraftPick) -> Result<(), StorageError>;

    /// Insert or replace many picks atomically.
    fn put_bulk(&self, picks: &[DraftPick]) -> Result<(), StorageError>;

    /// Delete a pick. Absent keys are ignored.
    fn delete(&self, id: PickId) -> Result<(), StorageError>;

    /// Drop the whole collection.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Shared handles to every collection of one Durable Store backend.
///
/// The Command Router owns one of these; nothing above the router ever sees
/// the store.
#[derive(Clone)]
pub struct StoreHandles {
    /// League metadata singleton.
    pub meta: Arc<dyn MetaStore>,
    /// Teams collection.
    pub teams: Arc<dyn TeamStore>,
    /// Players collection.
    pub players: Arc<dyn PlayerStore>,
    /// Games collection.
    pub games: Arc<dyn GameStore>,
    /// Archived seasons collection.
    pub seasons: Arc<dyn SeasonStore>,
    /// Archived per-season stat rows.
    pub player_stats: Arc<dyn PlayerStatStore>,
    /// Draft picks collection.
    pub draft_picks: Arc<dyn DraftPickStore>,
}

impl StoreHandles {
    /// Destroy every collection. Used by RESET_LEAGUE and before NEW_LEAGUE.
    pub fn wipe(&self) -> Result<(), StorageError> {
        self.meta.clear()?;
        self.teams.clear()?;
        self.players.clear()?;
        self.games.clear()?;
        self.seasons.clear()?;
        self.player_stats.clear()?;
        self.draft_picks.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_meta_store_object_safe(_: &dyn MetaStore) {}
    fn _assert_team_store_object_safe(_: &dyn TeamStore) {}
    fn _assert_player_store_object_safe(_: &dyn PlayerStore) {}
    fn _assert_game_store_object_safe(_: &dyn GameStore) {}
    fn _assert_season_store_object_safe(_: &dyn SeasonStore) {}
    fn _assert_stat_store_object_safe(_: &dyn PlayerStatStore) {}
    fn _assert_pick_store_object_safe(_: &dyn DraftPickStore) {}

    #[test]
    fn storage_error_display() {
        let err = StorageError::Backend("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = StorageError::Corrupted("CRC mismatch".to_string());
        assert!(err.to_string().contains("CRC mismatch"));
    }
}
