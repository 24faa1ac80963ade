//! The Flush Coordinator: drains the Dirty Tracker and persists the
//! corresponding Hot Cache entries to the Durable Store in bulk.
//!
//! `drain_dirty()` is the single atomic boundary between flush cycles; any
//! mutation landing after the drain belongs to the next cycle. On a storage
//! failure the drained snapshot is restored into the Dirty Tracker before the
//! error is surfaced, so a failed flush can be retried instead of silently
//! losing the batch. Retry policy itself stays with the caller.

use log::{debug, warn};

use crate::cache::{DirtyKind, DirtySnapshot, HotCache};
use crate::stats::{PlayerSeasonStat, StatKey};
use crate::storage::{StorageError, StoreHandles};

/// What a completed flush wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Records written (bulk puts plus the metadata save).
    pub puts: usize,
    /// Records deleted.
    pub deletes: usize,
}

impl FlushReport {
    /// True when the flush had nothing to do.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.puts == 0 && self.deletes == 0
    }
}

/// Persists dirty Hot Cache entries to the Durable Store.
pub struct FlushCoordinator {
    stores: StoreHandles,
}

impl FlushCoordinator {
    /// Create a coordinator writing through the given store handles.
    #[must_use]
    pub fn new(stores: StoreHandles) -> Self {
        Self { stores }
    }

    /// Persist everything dirty. No-ops when the cache is clean.
    ///
    /// # Errors
    /// Surfaces the first storage failure; the drained snapshot is restored
    /// into the Dirty Tracker first, so the batch is not lost.
    pub fn flush(&self, cache: &mut HotCache) -> Result<FlushReport, StorageError> {
        if !cache.is_dirty() {
            return Ok(FlushReport::default());
        }

        let snapshot = cache.drain_dirty();
        match self.apply(cache, &snapshot) {
            Ok(report) => {
                debug!("flush wrote {} puts, {} deletes", report.puts, report.deletes);
                Ok(report)
            }
            Err(e) => {
                warn!("flush failed, restoring {} dirty entries: {e}", snapshot.len());
                cache.restore_dirty(snapshot);
                Err(e)
            }
        }
    }

    fn apply(&self, cache: &HotCache, snapshot: &DirtySnapshot) -> Result<FlushReport, StorageError> {
        let mut report = FlushReport::default();

        // Teams. A key marked Upsert whose entry vanished afterwards would
        // have been re-marked Delete by the remover; resolving against the
        // cache keeps the stale-upsert case a delete as well.
        let mut puts = Vec::new();
        let mut deletes = Vec::new();
        for (&id, &kind) in &snapshot.teams {
            match (kind, cache.team(id)) {
                (DirtyKind::Upsert, Some(team)) => puts.push(team.clone()),
                _ => deletes.push(id),
            }
        }
        self.stores.teams.put_bulk(&puts)?;
        report.puts += puts.len();
        for id in deletes {
            self.stores.teams.delete(id)?;
            report.deletes += 1;
        }

        // Players.
        let mut puts = Vec::new();
        let mut deletes = Vec::new();
        for (&id, &kind) in &snapshot.players {
            match (kind, cache.player(id)) {
                (DirtyKind::Upsert, Some(player)) => puts.push(player.clone()),
                _ => deletes.push(id),
            }
        }
        self.stores.players.put_bulk(&puts)?;
        report.puts += puts.len();
        for id in deletes {
            self.stores.players.delete(id)?;
            report.deletes += 1;
        }

        // Newly produced games, then keyed game updates.
        self.stores.games.put_bulk(&snapshot.pending_games)?;
        report.puts += snapshot.pending_games.len();

        let mut puts = Vec::new();
        let mut deletes = Vec::new();
        for (&id, &kind) in &snapshot.games {
            match (kind, cache.game(id)) {
                (DirtyKind::Upsert, Some(game)) => puts.push(game.clone()),
                _ => deletes.push(id),
            }
        }
        self.stores.games.put_bulk(&puts)?;
        report.puts += puts.len();
        for id in deletes {
            self.stores.games.delete(id)?;
            report.deletes += 1;
        }

        // Season stat accumulators flush as archived rows keyed by the
        // current season, so a reload mid-season keeps its leader boards.
        if !snapshot.stats.is_empty() {
            if let Some(season) = cache.meta().map(|m| m.season) {
                let mut rows = Vec::new();
                let mut deletes = Vec::new();
                for (&player, &kind) in &snapshot.stats {
                    match (kind, cache.season_stat(player)) {
                        (DirtyKind::Upsert, Some(line)) => {
                            rows.push(PlayerSeasonStat::from_line(season, line));
                        }
                        _ => deletes.push(StatKey { season, player }),
                    }
                }
                self.stores.player_stats.put_bulk(&rows)?;
                report.puts += rows.len();
                for key in deletes {
                    self.stores.player_stats.delete(key)?;
                    report.deletes += 1;
                }
            } else {
                warn!("dropping {} dirty stat lines: no league metadata", snapshot.stats.len());
            }
        }

        // Draft picks.
        let mut puts = Vec::new();
        let mut deletes = Vec::new();
        for (&id, &kind) in &snapshot.picks {
            match (kind, cache.pick(id)) {
                (DirtyKind::Upsert, Some(pick)) => puts.push(pick.clone()),
                _ => deletes.push(id),
            }
        }
        self.stores.draft_picks.put_bulk(&puts)?;
        report.puts += puts.len();
        for id in deletes {
            self.stores.draft_picks.delete(id)?;
            report.deletes += 1;
        }

        // Metadata last, so a completed flush always has consistent meta.
        if snapshot.meta {
            match cache.meta() {
                Some(meta) => {
                    self.stores.meta.save(meta)?;
                    report.puts += 1;
                }
                None => {
                    self.stores.meta.clear()?;
                    report.deletes += 1;
                }
            }
        }

        Ok(report)
    }
}
