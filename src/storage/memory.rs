//! In-memory storage backend.
//!
//! Thread-safe in-memory implementations of the storage traits, used for
//! tests and ephemeral leagues, and as the reference implementation of the
//! collection contracts. Secondary indexes are maintained eagerly on every
//! write so reads stay filter-free.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

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

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// In-memory singleton metadata store.
#[derive(Debug, Default)]
pub struct InMemoryMetaStore {
    state: RwLock<Option<LeagueMeta>>,
}

impl MetaStore for InMemoryMetaStore {
    fn load(&self) -> Result<Option<LeagueMeta>, StorageError> {
        Ok(self.state.read().map_err(|_| lock_err("meta.load"))?.clone())
    }

    fn save(&self, meta: &LeagueMeta) -> Result<(), StorageError> {
        *self.state.write().map_err(|_| lock_err("meta.save"))? = Some(meta.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.state.write().map_err(|_| lock_err("meta.clear"))? = None;
        Ok(())
    }
}

/// In-memory teams collection.
#[derive(Debug, Default)]
pub struct InMemoryTeamStore {
    state: RwLock<HashMap<TeamId, Team>>,
}

impl TeamStore for InMemoryTeamStore {
    fn get(&self, id: TeamId) -> Result<Option<Team>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("teams.get"))?
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<Team>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("teams.get_all"))?;
        let mut teams: Vec<Team> = state.values().cloned().collect();
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    fn put(&self, team: &Team) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("teams.put"))?
            .insert(team.id, team.clone());
        Ok(())
    }

    fn put_bulk(&self, teams: &[Team]) -> Result<(), StorageError> {
        // One write guard for the whole batch keeps it all-or-nothing.
        let mut state = self.state.write().map_err(|_| lock_err("teams.put_bulk"))?;
        for team in teams {
            state.insert(team.id, team.clone());
        }
        Ok(())
    }

    fn delete(&self, id: TeamId) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("teams.delete"))?
            .remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("teams.clear"))?
            .clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PlayerState {
    by_id: HashMap<PlayerId, Player>,
    by_team: HashMap<TeamId, HashSet<PlayerId>>,
    by_pos: HashMap<Position, HashSet<PlayerId>>,
}

impl PlayerState {
    fn unindex(&mut self, player: &Player) {
        if let Some(team) = player.team_id {
            if let Some(set) = self.by_team.get_mut(&team) {
                set.remove(&player.id);
            }
        }
        if let Some(set) = self.by_pos.get_mut(&player.pos) {
            set.remove(&player.id);
        }
    }

    fn insert(&mut self, player: Player) {
        if let Some(old) = self.by_id.remove(&player.id) {
            self.unindex(&old);
        }
        if let Some(team) = player.team_id {
            self.by_team.entry(team).or_default().insert(player.id);
        }
        self.by_pos.entry(player.pos).or_default().insert(player.id);
        self.by_id.insert(player.id, player);
    }

    fn remove(&mut self, id: PlayerId) {
        if let Some(old) = self.by_id.remove(&id) {
            self.unindex(&old);
        }
    }

    fn collect(&self, ids: &HashSet<PlayerId>) -> Vec<Player> {
        let mut players: Vec<Player> = ids
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect();
        players.sort_by_key(|p| p.id);
        players
    }
}

/// In-memory players collection, indexed by team and position.
#[derive(Debug, Default)]
pub struct InMemoryPlayerStore {
    state: RwLock<PlayerState>,
}

impl PlayerStore for InMemoryPlayerStore {
    fn get(&self, id: PlayerId) -> Result<Option<Player>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("players.get"))?
            .by_id
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<Player>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("players.get_all"))?;
        let mut players: Vec<Player> = state.by_id.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        Ok(players)
    }

    fn by_team(&self, team: TeamId) -> Result<Vec<Player>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("players.by_team"))?;
        Ok(state
            .by_team
            .get(&team)
            .map(|ids| state.collect(ids))
            .unwrap_or_default())
    }

    fn by_position(&self, pos: Position) -> Result<Vec<Player>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("players.by_position"))?;
        Ok(state
            .by_pos
            .get(&pos)
            .map(|ids| state.collect(ids))
            .unwrap_or_default())
    }

    fn put(&self, player: &Player) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("players.put"))?
            .insert(player.clone());
        Ok(())
    }

    fn put_bulk(&self, players: &[Player]) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("players.put_bulk"))?;
        for player in players {
            state.insert(player.clone());
        }
        Ok(())
    }

    fn delete(&self, id: PlayerId) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("players.delete"))?
            .remove(id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("players.clear"))?;
        *state = PlayerState::default();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct GameState {
    by_id: HashMap<GameId, GameRecord>,
    by_season: HashMap<SeasonId, HashSet<GameId>>,
}

impl GameState {
    fn insert(&mut self, game: GameRecord) {
        self.by_season
            .entry(game.id.season)
            .or_default()
            .insert(game.id);
        self.by_id.insert(game.id, game);
    }

    fn remove(&mut self, id: GameId) {
        if self.by_id.remove(&id).is_some() {
            if let Some(set) = self.by_season.get_mut(&id.season) {
                set.remove(&id);
            }
        }
    }

    fn season_games(&self, season: SeasonId) -> Vec<GameRecord> {
        let mut games: Vec<GameRecord> = self
            .by_season
            .get(&season)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect();
        games.sort_by_key(|g| g.id);
        games
    }
}

/// In-memory games collection, indexed by season (week filters the season
/// index).
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    state: RwLock<GameState>,
}

impl GameStore for InMemoryGameStore {
    fn get(&self, id: GameId) -> Result<Option<GameRecord>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("games.get"))?
            .by_id
            .get(&id)
            .cloned())
    }

    fn by_season(&self, season: SeasonId) -> Result<Vec<GameRecord>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("games.by_season"))?
            .season_games(season))
    }

    fn by_week(&self, season: SeasonId, week: u32) -> Result<Vec<GameRecord>, StorageError> {
        let mut games = self
            .state
            .read()
            .map_err(|_| lock_err("games.by_week"))?
            .season_games(season);
        games.retain(|g| g.id.week == week);
        Ok(games)
    }

    fn put(&self, game: &GameRecord) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("games.put"))?
            .insert(game.clone());
        Ok(())
    }

    fn put_bulk(&self, games: &[GameRecord]) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("games.put_bulk"))?;
        for game in games {
            state.insert(game.clone());
        }
        Ok(())
    }

    fn delete(&self, id: GameId) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("games.delete"))?
            .remove(id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("games.clear"))?;
        *state = GameState::default();
        Ok(())
    }
}

/// In-memory archived seasons collection, indexed by year.
#[derive(Debug, Default)]
pub struct InMemorySeasonStore {
    state: RwLock<HashMap<SeasonId, SeasonSummary>>,
}

impl SeasonStore for InMemorySeasonStore {
    fn get(&self, id: SeasonId) -> Result<Option<SeasonSummary>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("seasons.get"))?
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<SeasonSummary>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("seasons.get_all"))?;
        let mut seasons: Vec<SeasonSummary> = state.values().cloned().collect();
        seasons.sort_by_key(|s| s.season);
        Ok(seasons)
    }

    fn by_year(&self, year: u32) -> Result<Vec<SeasonSummary>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("seasons.by_year"))?;
        let mut seasons: Vec<SeasonSummary> = state
            .values()
            .filter(|s| s.year == year)
            .cloned()
            .collect();
        seasons.sort_by_key(|s| s.season);
        Ok(seasons)
    }

    fn put(&self, season: &SeasonSummary) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("seasons.put"))?
            .insert(season.season, season.clone());
        Ok(())
    }

    fn delete(&self, id: SeasonId) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("seasons.delete"))?
            .remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("seasons.clear"))?
            .clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct StatState {
    by_key: HashMap<StatKey, PlayerSeasonStat>,
    by_season: HashMap<SeasonId, HashSet<StatKey>>,
    by_player: HashMap<PlayerId, HashSet<StatKey>>,
}

impl StatState {
    fn insert(&mut self, row: PlayerSeasonStat) {
        self.by_season
            .entry(row.key.season)
            .or_default()
            .insert(row.key);
        self.by_player
            .entry(row.key.player)
            .or_default()
            .insert(row.key);
        self.by_key.insert(row.key, row);
    }

    fn remove(&mut self, key: StatKey) {
        if self.by_key.remove(&key).is_some() {
            if let Some(set) = self.by_season.get_mut(&key.season) {
                set.remove(&key);
            }
            if let Some(set) = self.by_player.get_mut(&key.player) {
                set.remove(&key);
            }
        }
    }

    fn collect(&self, keys: &HashSet<StatKey>) -> Vec<PlayerSeasonStat> {
        let mut rows: Vec<PlayerSeasonStat> = keys
            .iter()
            .filter_map(|k| self.by_key.get(k).cloned())
            .collect();
        rows.sort_by_key(|r| r.key);
        rows
    }
}

/// In-memory archived stat rows, indexed by season and player.
#[derive(Debug, Default)]
pub struct InMemoryPlayerStatStore {
    state: RwLock<StatState>,
}

impl PlayerStatStore for InMemoryPlayerStatStore {
    fn get(&self, key: StatKey) -> Result<Option<PlayerSeasonStat>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("player_stats.get"))?
            .by_key
            .get(&key)
            .cloned())
    }

    fn by_season(&self, season: SeasonId) -> Result<Vec<PlayerSeasonStat>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("player_stats.by_season"))?;
        Ok(state
            .by_season
            .get(&season)
            .map(|keys| state.collect(keys))
            .unwrap_or_default())
    }

    fn by_player(&self, player: PlayerId) -> Result<Vec<PlayerSeasonStat>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("player_stats.by_player"))?;
        Ok(state
            .by_player
            .get(&player)
            .map(|keys| state.collect(keys))
            .unwrap_or_default())
    }

    fn put(&self, row: &PlayerSeasonStat) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("player_stats.put"))?
            .insert(row.clone());
        Ok(())
    }

    fn put_bulk(&self, rows: &[PlayerSeasonStat]) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("player_stats.put_bulk"))?;
        for row in rows {
            state.insert(row.clone());
        }
        Ok(())
    }

    fn delete(&self, key: StatKey) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("player_stats.delete"))?
            .remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("player_stats.clear"))?;
        *state = StatState::default();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PickState {
    by_id: HashMap<PickId, DraftPick>,
    by_owner: HashMap<TeamId, HashSet<PickId>>,
}

impl PickState {
    fn insert(&mut self, pick: DraftPick) {
        if let Some(old) = self.by_id.remove(&pick.id) {
            if let Some(set) = self.by_owner.get_mut(&old.owner) {
                set.remove(&old.id);
            }
        }
        self.by_owner.entry(pick.owner).or_default().insert(pick.id);
        self.by_id.insert(pick.id, pick);
    }

    fn remove(&mut self, id: PickId) {
        if let Some(old) = self.by_id.remove(&id) {
            if let Some(set) = self.by_owner.get_mut(&old.owner) {
                set.remove(&old.id);
            }
        }
    }
}

/// In-memory draft picks collection, indexed by current owner (year filters a
/// scan).
#[derive(Debug, Default)]
pub struct InMemoryDraftPickStore {
    state: RwLock<PickState>,
}

impl DraftPickStore for InMemoryDraftPickStore {
    fn get(&self, id: PickId) -> Result<Option<DraftPick>, StorageError> {
        Ok(self
            .state
            .read()
            .map_err(|_| lock_err("draft_picks.get"))?
            .by_id
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<DraftPick>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("draft_picks.get_all"))?;
        let mut picks: Vec<DraftPick> = state.by_id.values().cloned().collect();
        picks.sort_by_key(|p| p.id);
        Ok(picks)
    }

    fn by_owner(&self, team: TeamId) -> Result<Vec<DraftPick>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("draft_picks.by_owner"))?;
        let mut picks: Vec<DraftPick> = state
            .by_owner
            .get(&team)
            .into_iter()
            .flatten()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect();
        picks.sort_by_key(|p| p.id);
        Ok(picks)
    }

    fn by_year(&self, year: u32) -> Result<Vec<DraftPick>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("draft_picks.by_year"))?;
        let mut picks: Vec<DraftPick> = state
            .by_id
            .values()
            .filter(|p| p.year == year)
            .cloned()
            .collect();
        picks.sort_by_key(|p| p.id);
        Ok(picks)
    }

    fn put(&self, pick: &DraftPick) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("draft_picks.put"))?
            .insert(pick.clone());
        Ok(())
    }

    fn put_bulk(&self, picks: &[DraftPick]) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("draft_picks.put_bulk"))?;
        for pick in picks {
            state.insert(pick.clone());
        }
        Ok(())
    }

    fn delete(&self, id: PickId) -> Result<(), StorageError> {
        self.state
            .write()
            .map_err(|_| lock_err("draft_picks.delete"))?
            .remove(id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("draft_picks.clear"))?;
        *state = PickState::default();
        Ok(())
    }
}

/// Aggregate of every in-memory collection.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    /// League metadata singleton.
    pub meta: InMemoryMetaStore,
    /// Teams collection.
    pub teams: InMemoryTeamStore,
    /// Players collection.
    pub players: InMemoryPlayerStore,
    /// Games collection.
    pub games: InMemoryGameStore,
    /// Archived seasons collection.
    pub seasons: InMemorySeasonStore,
    /// Archived stat rows.
    pub player_stats: InMemoryPlayerStatStore,
    /// Draft picks collection.
    pub draft_picks: InMemoryDraftPickStore,
}

impl InMemoryStores {
    /// Wrap the stores in shared handles for the Command Router.
    #[must_use]
    pub fn into_handles(self) -> StoreHandles {
        StoreHandles {
            meta: Arc::new(self.meta),
            teams: Arc::new(self.teams),
            players: Arc::new(self.players),
            games: Arc::new(self.games),
            seasons: Arc::new(self.seasons),
            player_stats: Arc::new(self.player_stats),
            draft_picks: Arc::new(self.draft_picks),
        }
    }

    /// Fresh handles backed by empty collections.
    #[must_use]
    pub fn handles() -> StoreHandles {
        Self::default().into_handles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Contract;
    use crate::stats::StatTotals;

    fn player(id: u32, team: Option<u32>, pos: Position) -> Player {
        Player {
            id: PlayerId(id),
            name: format!("Player {id}"),
            pos,
            age: 24,
            overall: 70,
            potential: 80,
            contract: Some(Contract {
                salary: 1_000_000,
                years: 1,
            }),
            team_id: team.map(TeamId),
            career: StatTotals::default(),
        }
    }

    #[test]
    fn player_indexes_follow_a_team_change() {
        let store = InMemoryPlayerStore::default();
        store.put(&player(1, Some(0), Position::QB)).unwrap();

        assert_eq!(store.by_team(TeamId(0)).unwrap().len(), 1);

        // Trade: same player, new team. The old index entry must go.
        store.put(&player(1, Some(2), Position::QB)).unwrap();
        assert!(store.by_team(TeamId(0)).unwrap().is_empty());
        assert_eq!(store.by_team(TeamId(2)).unwrap().len(), 1);
    }

    #[test]
    fn released_player_leaves_the_team_index() {
        let store = InMemoryPlayerStore::default();
        store.put(&player(1, Some(0), Position::WR)).unwrap();
        store.put(&player(1, None, Position::WR)).unwrap();

        assert!(store.by_team(TeamId(0)).unwrap().is_empty());
        assert_eq!(store.by_position(Position::WR).unwrap().len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryPlayerStore::default();
        store.put(&player(1, None, Position::RB)).unwrap();
        store.delete(PlayerId(1)).unwrap();
        store.delete(PlayerId(1)).unwrap();
        assert!(store.get(PlayerId(1)).unwrap().is_none());
    }

    #[test]
    fn games_filter_by_season_and_week() {
        use crate::season::SeasonId;

        let store = InMemoryGameStore::default();
        for week in 1..=3 {
            store
                .put(&GameRecord {
                    id: GameId {
                        season: SeasonId(1),
                        week,
                        home: TeamId(0),
                        away: TeamId(1),
                    },
                    home_score: 20,
                    away_score: 13,
                    box_score: None,
                })
                .unwrap();
        }

        assert_eq!(store.by_season(SeasonId(1)).unwrap().len(), 3);
        assert_eq!(store.by_week(SeasonId(1), 2).unwrap().len(), 1);
        assert!(store.by_season(SeasonId(2)).unwrap().is_empty());
    }

    #[test]
    fn stat_rows_index_by_season_and_player() {
        use crate::season::SeasonId;

        let store = InMemoryPlayerStatStore::default();
        for season in 1..=2 {
            store
                .put(&PlayerSeasonStat {
                    key: StatKey {
                        season: SeasonId(season),
                        player: PlayerId(7),
                    },
                    team_id: TeamId(0),
                    totals: StatTotals::default(),
                })
                .unwrap();
        }

        assert_eq!(store.by_player(PlayerId(7)).unwrap().len(), 2);
        assert_eq!(store.by_season(SeasonId(1)).unwrap().len(), 1);
    }

    #[test]
    fn pick_owner_index_follows_trades() {
        let store = InMemoryDraftPickStore::default();
        let mut pick = DraftPick {
            id: PickId(1),
            round: 1,
            year: 2026,
            original_owner: TeamId(0),
            owner: TeamId(0),
            selection: None,
        };
        store.put(&pick).unwrap();

        pick.owner = TeamId(3);
        store.put(&pick).unwrap();

        assert!(store.by_owner(TeamId(0)).unwrap().is_empty());
        assert_eq!(store.by_owner(TeamId(3)).unwrap().len(), 1);
        // Original owner is preserved on the record itself.
        assert_eq!(
            store.get(PickId(1)).unwrap().unwrap().original_owner,
            TeamId(0)
        );
    }

    #[test]
    fn wipe_clears_every_collection() {
        let handles = InMemoryStores::handles();
        handles
            .players
            .put(&player(1, Some(0), Position::QB))
            .unwrap();

        handles.wipe().unwrap();
        assert!(handles.players.get_all().unwrap().is_empty());
        assert!(handles.meta.load().unwrap().is_none());
    }
}
