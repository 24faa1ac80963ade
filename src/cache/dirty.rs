//! Dirty tracking for the Hot Cache.
//!
//! The tracker records which keys changed since the last flush, one entry per
//! collection, plus an un-keyed append buffer for newly produced game
//! records. It never touches the Durable Store; it only answers "what
//! changed". Intent is tagged explicitly (`Upsert` vs `Delete`) rather than
//! inferred from cache state at flush time.

use std::collections::HashMap;

use crate::draft::PickId;
use crate::game::{GameId, GameRecord};
use crate::player::PlayerId;
use crate::team::TeamId;

/// What a dirty key means for the next flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyKind {
    /// Write the current Hot Cache value.
    Upsert,
    /// Remove the key from the Durable Store.
    Delete,
}

/// A drained, immutable view of everything pending persistence.
///
/// This snapshot is the only contract the Flush Coordinator needs.
#[derive(Debug, Default)]
pub struct DirtySnapshot {
    /// Whether the league metadata record changed.
    pub meta: bool,
    /// Dirty team keys.
    pub teams: HashMap<TeamId, DirtyKind>,
    /// Dirty player keys.
    pub players: HashMap<PlayerId, DirtyKind>,
    /// Dirty keyed game records (updates to already-persisted games).
    pub games: HashMap<GameId, DirtyKind>,
    /// Dirty current-season stat accumulators, keyed by player.
    pub stats: HashMap<PlayerId, DirtyKind>,
    /// Dirty draft-pick keys.
    pub picks: HashMap<PickId, DirtyKind>,
    /// Newly produced game records, in production order.
    pub pending_games: Vec<GameRecord>,
}

impl DirtySnapshot {
    /// True when the snapshot carries nothing to persist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.meta
            && self.teams.is_empty()
            && self.players.is_empty()
            && self.games.is_empty()
            && self.stats.is_empty()
            && self.picks.is_empty()
            && self.pending_games.is_empty()
    }

    /// Total number of dirty keys plus buffered games.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.meta)
            + self.teams.len()
            + self.players.len()
            + self.games.len()
            + self.stats.len()
            + self.picks.len()
            + self.pending_games.len()
    }
}

/// Per-collection record of mutations since the last drain.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    meta: bool,
    teams: HashMap<TeamId, DirtyKind>,
    players: HashMap<PlayerId, DirtyKind>,
    games: HashMap<GameId, DirtyKind>,
    stats: HashMap<PlayerId, DirtyKind>,
    picks: HashMap<PickId, DirtyKind>,
    pending_games: Vec<GameRecord>,
}

impl DirtyTracker {
    /// Mark the singleton metadata record.
    pub fn mark_meta(&mut self) {
        self.meta = true;
    }

    /// Mark a team key. A later mark overwrites an earlier one, so each key
    /// appears at most once per drain with its latest intent.
    pub fn mark_team(&mut self, id: TeamId, kind: DirtyKind) {
        self.teams.insert(id, kind);
    }

    /// Mark a player key.
    pub fn mark_player(&mut self, id: PlayerId, kind: DirtyKind) {
        self.players.insert(id, kind);
    }

    /// Mark a keyed game record.
    pub fn mark_game(&mut self, id: GameId, kind: DirtyKind) {
        self.games.insert(id, kind);
    }

    /// Mark a season stat accumulator.
    pub fn mark_stat(&mut self, id: PlayerId, kind: DirtyKind) {
        self.stats.insert(id, kind);
    }

    /// Mark a draft pick.
    pub fn mark_pick(&mut self, id: PickId, kind: DirtyKind) {
        self.picks.insert(id, kind);
    }

    /// Append a newly produced game record to the un-keyed buffer.
    pub fn push_game(&mut self, record: GameRecord) {
        self.pending_games.push(record);
    }

    /// Forget any pending marks for the stat accumulators.
    ///
    /// Season rollover clears accumulators after folding them into career
    /// totals; the archived rows are written separately, so no deletions may
    /// be queued here.
    pub fn forget_stats(&mut self) {
        self.stats.clear();
    }

    /// Cheap non-destructive check used to skip unnecessary flush cycles.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.meta
            || !self.teams.is_empty()
            || !self.players.is_empty()
            || !self.games.is_empty()
            || !self.stats.is_empty()
            || !self.picks.is_empty()
            || !self.pending_games.is_empty()
    }

    /// Return and atomically clear everything pending.
    ///
    /// This is the single boundary between "mutations visible to future
    /// flushes" and "mutations claimed by the current flush": anything marked
    /// after this call belongs to the next cycle.
    pub fn drain(&mut self) -> DirtySnapshot {
        DirtySnapshot {
            meta: std::mem::take(&mut self.meta),
            teams: std::mem::take(&mut self.teams),
            players: std::mem::take(&mut self.players),
            games: std::mem::take(&mut self.games),
            stats: std::mem::take(&mut self.stats),
            picks: std::mem::take(&mut self.picks),
            pending_games: std::mem::take(&mut self.pending_games),
        }
    }

    /// Re-queue a drained snapshot after a failed flush.
    ///
    /// Keys re-marked since the drain keep their newer intent; buffered games
    /// from the snapshot are replayed ahead of any produced since.
    pub fn restore(&mut self, snapshot: DirtySnapshot) {
        self.meta |= snapshot.meta;
        for (id, kind) in snapshot.teams {
            self.teams.entry(id).or_insert(kind);
        }
        for (id, kind) in snapshot.players {
            self.players.entry(id).or_insert(kind);
        }
        for (id, kind) in snapshot.games {
            self.games.entry(id).or_insert(kind);
        }
        for (id, kind) in snapshot.stats {
            self.stats.entry(id).or_insert(kind);
        }
        for (id, kind) in snapshot.picks {
            self.picks.entry(id).or_insert(kind);
        }
        let newer = std::mem::replace(&mut self.pending_games, snapshot.pending_games);
        self.pending_games.extend(newer);
    }

    /// Clear everything without producing a snapshot. Used when a save is
    /// discarded or replaced wholesale.
    pub fn clear(&mut self) {
        self.meta = false;
        self.teams.clear();
        self.players.clear();
        self.games.clear();
        self.stats.clear();
        self.picks.clear();
        self.pending_games.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::SeasonId;

    fn game(week: u32) -> GameRecord {
        GameRecord {
            id: GameId {
                season: SeasonId(1),
                week,
                home: TeamId(0),
                away: TeamId(1),
            },
            home_score: 20,
            away_score: 17,
            box_score: None,
        }
    }

    #[test]
    fn each_touched_key_appears_exactly_once_per_drain() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_team(TeamId(0), DirtyKind::Upsert);
        tracker.mark_team(TeamId(0), DirtyKind::Upsert);
        tracker.mark_team(TeamId(1), DirtyKind::Upsert);
        tracker.mark_player(PlayerId(5), DirtyKind::Delete);

        let snapshot = tracker.drain();
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[&PlayerId(5)], DirtyKind::Delete);

        // Tracker is empty immediately after the drain.
        assert!(!tracker.is_dirty());
        assert!(tracker.drain().is_empty());
    }

    #[test]
    fn latest_mark_wins_per_key() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_player(PlayerId(3), DirtyKind::Upsert);
        tracker.mark_player(PlayerId(3), DirtyKind::Delete);

        let snapshot = tracker.drain();
        assert_eq!(snapshot.players[&PlayerId(3)], DirtyKind::Delete);
    }

    #[test]
    fn pending_games_drain_in_order() {
        let mut tracker = DirtyTracker::default();
        tracker.push_game(game(1));
        tracker.push_game(game(2));

        let snapshot = tracker.drain();
        assert_eq!(snapshot.pending_games.len(), 2);
        assert_eq!(snapshot.pending_games[0].id.week, 1);
        assert_eq!(snapshot.pending_games[1].id.week, 2);
    }

    #[test]
    fn restore_keeps_newer_marks_and_replays_older_games_first() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_team(TeamId(0), DirtyKind::Upsert);
        tracker.push_game(game(1));
        let snapshot = tracker.drain();

        // Mutations landing after the drain belong to the next cycle.
        tracker.mark_team(TeamId(0), DirtyKind::Delete);
        tracker.push_game(game(2));

        tracker.restore(snapshot);

        let merged = tracker.drain();
        assert_eq!(merged.teams[&TeamId(0)], DirtyKind::Delete);
        assert_eq!(merged.pending_games[0].id.week, 1);
        assert_eq!(merged.pending_games[1].id.week, 2);
    }

    #[test]
    fn forget_stats_drops_only_stat_marks() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_stat(PlayerId(1), DirtyKind::Upsert);
        tracker.mark_team(TeamId(0), DirtyKind::Upsert);

        tracker.forget_stats();

        let snapshot = tracker.drain();
        assert!(snapshot.stats.is_empty());
        assert_eq!(snapshot.teams.len(), 1);
    }
}
