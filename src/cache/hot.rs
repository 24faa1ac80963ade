//! The Hot Cache: in-memory mirror of the current season's live entities.
//!
//! All simulation logic reads and mutates this structure directly; it is the
//! only state consumers may address field-by-field. Every mutating accessor
//! marks the affected key in the embedded [`DirtyTracker`] so the Flush
//! Coordinator can persist exactly what changed.

use std::collections::HashMap;

use crate::cache::dirty::{DirtyKind, DirtySnapshot, DirtyTracker};
use crate::draft::{DraftPick, PickId};
use crate::game::{GameId, GameRecord};
use crate::meta::LeagueMeta;
use crate::player::{Player, PlayerId};
use crate::stats::{SeasonStatLine, StatDelta};
use crate::team::{Team, TeamId};

/// A fully materialized league state, used to hydrate the cache from the
/// Durable Store and to build one at league creation.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    /// League metadata singleton.
    pub meta: Option<LeagueMeta>,
    /// All teams.
    pub teams: Vec<Team>,
    /// All players, rostered and free agents.
    pub players: Vec<Player>,
    /// Current-season games already played.
    pub games: Vec<GameRecord>,
    /// Current-season stat accumulators.
    pub season_stats: Vec<SeasonStatLine>,
    /// Outstanding draft picks.
    pub draft_picks: Vec<DraftPick>,
}

/// In-memory working set for the current season.
#[derive(Debug, Default)]
pub struct HotCache {
    meta: Option<LeagueMeta>,
    teams: HashMap<TeamId, Team>,
    players: HashMap<PlayerId, Player>,
    games: HashMap<GameId, GameRecord>,
    season_stats: HashMap<PlayerId, SeasonStatLine>,
    draft_picks: HashMap<PickId, DraftPick>,
    dirty: DirtyTracker,
}

impl HotCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Meta ──────────────────────────────────────────────────────────────

    /// The league metadata, if a league is loaded.
    #[must_use]
    pub fn meta(&self) -> Option<&LeagueMeta> {
        self.meta.as_ref()
    }

    /// Replace the metadata record.
    pub fn set_meta(&mut self, meta: LeagueMeta) {
        self.meta = Some(meta);
        self.dirty.mark_meta();
    }

    /// Mutate the metadata in place. Returns false if no league is loaded.
    pub fn update_meta(&mut self, f: impl FnOnce(&mut LeagueMeta)) -> bool {
        match self.meta.as_mut() {
            Some(meta) => {
                f(meta);
                self.dirty.mark_meta();
                true
            }
            None => false,
        }
    }

    // ── Teams ─────────────────────────────────────────────────────────────

    /// Look up a team.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    /// Insert or replace a team.
    pub fn set_team(&mut self, team: Team) {
        self.dirty.mark_team(team.id, DirtyKind::Upsert);
        self.teams.insert(team.id, team);
    }

    /// Mutate a team in place. Returns false if the team is absent.
    pub fn update_team(&mut self, id: TeamId, f: impl FnOnce(&mut Team)) -> bool {
        match self.teams.get_mut(&id) {
            Some(team) => {
                f(team);
                self.dirty.mark_team(id, DirtyKind::Upsert);
                true
            }
            None => false,
        }
    }

    /// Remove a team, signaling deletion on the next flush.
    pub fn remove_team(&mut self, id: TeamId) -> Option<Team> {
        let removed = self.teams.remove(&id);
        if removed.is_some() {
            self.dirty.mark_team(id, DirtyKind::Delete);
        }
        removed
    }

    /// Iterate all teams in unspecified order.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    // ── Players ───────────────────────────────────────────────────────────

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Insert or replace a player.
    pub fn set_player(&mut self, player: Player) {
        self.dirty.mark_player(player.id, DirtyKind::Upsert);
        self.players.insert(player.id, player);
    }

    /// Mutate a player in place. Returns false if the player is absent.
    pub fn update_player(&mut self, id: PlayerId, f: impl FnOnce(&mut Player)) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                f(player);
                self.dirty.mark_player(id, DirtyKind::Upsert);
                true
            }
            None => false,
        }
    }

    /// Remove a player, signaling deletion on the next flush.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            self.dirty.mark_player(id, DirtyKind::Delete);
        }
        removed
    }

    /// Iterate all players in unspecified order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// All players currently rostered by `team`, in id order.
    #[must_use]
    pub fn players_by_team(&self, team: TeamId) -> Vec<&Player> {
        let mut players: Vec<&Player> = self
            .players
            .values()
            .filter(|p| p.team_id == Some(team))
            .collect();
        players.sort_by_key(|p| p.id);
        players
    }

    // ── Games ─────────────────────────────────────────────────────────────

    /// Look up a played game.
    #[must_use]
    pub fn game(&self, id: GameId) -> Option<&GameRecord> {
        self.games.get(&id)
    }

    /// Record a newly produced game: appended to the pending buffer for the
    /// next flush and mirrored into the keyed map for reads.
    pub fn push_game(&mut self, record: GameRecord) {
        self.dirty.push_game(record.clone());
        self.games.insert(record.id, record);
    }

    /// Replace an already-recorded game (e.g. a box-score correction).
    pub fn set_game(&mut self, record: GameRecord) {
        self.dirty.mark_game(record.id, DirtyKind::Upsert);
        self.games.insert(record.id, record);
    }

    /// Remove a game, signaling deletion on the next flush.
    pub fn remove_game(&mut self, id: GameId) -> Option<GameRecord> {
        let removed = self.games.remove(&id);
        if removed.is_some() {
            self.dirty.mark_game(id, DirtyKind::Delete);
        }
        removed
    }

    /// Iterate the cached games.
    pub fn games(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.values()
    }

    /// Games played in the given week of the current season.
    #[must_use]
    pub fn games_by_week(&self, week: u32) -> Vec<&GameRecord> {
        self.games.values().filter(|g| g.id.week == week).collect()
    }

    /// Drop all cached games without queuing deletions. Used at season
    /// rollover: the records stay durable, only the working set is pruned.
    pub fn prune_games(&mut self) {
        self.games.clear();
    }

    // ── Season stats ──────────────────────────────────────────────────────

    /// Current-season accumulator for a player.
    #[must_use]
    pub fn season_stat(&self, id: PlayerId) -> Option<&SeasonStatLine> {
        self.season_stats.get(&id)
    }

    /// Additively merge `delta` into the player's accumulator, creating it on
    /// first use. Attribution fields are set at creation and never
    /// overwritten by later merges; calling this several times per week is
    /// fine.
    pub fn update_season_stat(&mut self, player: PlayerId, team: TeamId, delta: &StatDelta) {
        let line = self
            .season_stats
            .entry(player)
            .or_insert_with(|| SeasonStatLine {
                player_id: player,
                team_id: team,
                totals: crate::stats::StatTotals::default(),
            });
        delta.apply_to(&mut line.totals);
        self.dirty.mark_stat(player, DirtyKind::Upsert);
    }

    /// Iterate the current-season accumulators.
    pub fn season_stats(&self) -> impl Iterator<Item = &SeasonStatLine> {
        self.season_stats.values()
    }

    /// Read-once-and-clear the accumulators for season rollover.
    ///
    /// The clear does not queue deletions: accumulators are folded into
    /// career totals and archived as per-season rows by the caller, never
    /// flushed as live stats.
    pub fn take_season_stats(&mut self) -> Vec<SeasonStatLine> {
        self.dirty.forget_stats();
        let mut lines: Vec<SeasonStatLine> = self.season_stats.drain().map(|(_, v)| v).collect();
        lines.sort_by_key(|l| l.player_id);
        lines
    }

    // ── Draft picks ───────────────────────────────────────────────────────

    /// Look up a draft pick.
    #[must_use]
    pub fn pick(&self, id: PickId) -> Option<&DraftPick> {
        self.draft_picks.get(&id)
    }

    /// Insert or replace a draft pick.
    pub fn set_pick(&mut self, pick: DraftPick) {
        self.dirty.mark_pick(pick.id, DirtyKind::Upsert);
        self.draft_picks.insert(pick.id, pick);
    }

    /// Mutate a pick in place. Returns false if the pick is absent.
    pub fn update_pick(&mut self, id: PickId, f: impl FnOnce(&mut DraftPick)) -> bool {
        match self.draft_picks.get_mut(&id) {
            Some(pick) => {
                f(pick);
                self.dirty.mark_pick(id, DirtyKind::Upsert);
                true
            }
            None => false,
        }
    }

    /// Remove a pick, signaling deletion on the next flush.
    pub fn remove_pick(&mut self, id: PickId) -> Option<DraftPick> {
        let removed = self.draft_picks.remove(&id);
        if removed.is_some() {
            self.dirty.mark_pick(id, DirtyKind::Delete);
        }
        removed
    }

    /// Iterate all draft picks.
    pub fn picks(&self) -> impl Iterator<Item = &DraftPick> {
        self.draft_picks.values()
    }

    /// Picks currently held by `team`, in id order.
    #[must_use]
    pub fn picks_by_owner(&self, team: TeamId) -> Vec<&DraftPick> {
        let mut picks: Vec<&DraftPick> = self
            .draft_picks
            .values()
            .filter(|p| p.owner == team)
            .collect();
        picks.sort_by_key(|p| p.id);
        picks
    }

    // ── Derived aggregates ────────────────────────────────────────────────

    /// Recompute a team's cap usage from its current roster's contracts.
    /// Returns false if the team is absent.
    pub fn recompute_team_cap(&mut self, id: TeamId) -> bool {
        let cap_used: u64 = self
            .players
            .values()
            .filter(|p| p.team_id == Some(id))
            .filter_map(|p| p.contract.map(|c| c.salary))
            .sum();
        self.update_team(id, |team| team.cap_used = cap_used)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Bulk-load a previously persisted league without marking anything
    /// dirty: the data already matches the Durable Store.
    pub fn hydrate(&mut self, snapshot: LeagueSnapshot) {
        self.reset();
        self.meta = snapshot.meta;
        self.teams = snapshot.teams.into_iter().map(|t| (t.id, t)).collect();
        self.players = snapshot.players.into_iter().map(|p| (p.id, p)).collect();
        self.games = snapshot.games.into_iter().map(|g| (g.id, g)).collect();
        self.season_stats = snapshot
            .season_stats
            .into_iter()
            .map(|s| (s.player_id, s))
            .collect();
        self.draft_picks = snapshot.draft_picks.into_iter().map(|p| (p.id, p)).collect();
    }

    /// Clear everything, including pending dirty state. Used when a save is
    /// discarded.
    pub fn reset(&mut self) {
        self.meta = None;
        self.teams.clear();
        self.players.clear();
        self.games.clear();
        self.season_stats.clear();
        self.draft_picks.clear();
        self.dirty.clear();
    }

    // ── Dirty tracking ────────────────────────────────────────────────────

    /// Cheap non-destructive dirtiness check.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Return and atomically clear the pending dirty state.
    pub fn drain_dirty(&mut self) -> DirtySnapshot {
        self.dirty.drain()
    }

    /// Re-queue a drained snapshot after a failed flush.
    pub fn restore_dirty(&mut self, snapshot: DirtySnapshot) {
        self.dirty.restore(snapshot);
    }
}
