//! Command handlers.
//!
//! [`LeagueService`] owns the Hot Cache, History Cache, Flush Coordinator,
//! and store handles, and executes every command strictly sequentially on the
//! runtime's owner thread. Handlers mutate the cache, flush, and answer with
//! projections; errors are returned, never thrown past the router boundary.
//!
//! Mutations applied before a failure are not rolled back; partial
//! application is accepted, documented semantics.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::cache::{HistoryCache, HotCache, LeagueSnapshot};
use crate::draft::{DraftPick, PickId};
use crate::error::{LeagueError, LeagueResult, NotFoundError, ValidationError};
use crate::flush::FlushCoordinator;
use crate::game::{GameId, GameRecord};
use crate::generate::{self, LeagueOptions, TeamDef};
use crate::meta::{LeagueMeta, Phase, ScheduledGame, SettingsPatch};
use crate::player::{Contract, PlayerId, Position};
use crate::season::{Award, SeasonId, SeasonSummary, StandingRow};
use crate::sim::{GameSimulator, SimRequest, SimTeam};
use crate::stats::{PlayerSeasonStat, SeasonStatLine, StatTotals};
use crate::storage::StoreHandles;
use crate::team::TeamId;

use super::{
    Command, Event, GameResultView, LeaderRow, LeagueLeaders, LeagueProjection, PlayerView,
    ResponseBody, RosterSlice, TeamView, WeekOutcome,
};

/// Tuning knobs for the service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Games handed to the simulator per batch; a progress event fires
    /// between batches.
    pub sim_batch_size: usize,
    /// History Cache capacity.
    pub history_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sim_batch_size: 4,
            history_capacity: crate::cache::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Owner-thread league state and its command handlers.
pub struct LeagueService {
    cache: HotCache,
    history: HistoryCache,
    stores: StoreHandles,
    flush: FlushCoordinator,
    sim: Box<dyn GameSimulator>,
    batch_size: usize,
}

impl LeagueService {
    /// Build a service over the given store backend and simulator.
    #[must_use]
    pub fn new(stores: StoreHandles, sim: Box<dyn GameSimulator>, config: ServiceConfig) -> Self {
        Self {
            cache: HotCache::new(),
            history: HistoryCache::new(config.history_capacity),
            flush: FlushCoordinator::new(stores.clone()),
            stores,
            sim,
            batch_size: config.sim_batch_size.max(1),
        }
    }

    /// Execute one command. `progress` receives unsolicited events fired
    /// while the command runs.
    pub fn handle(
        &mut self,
        command: Command,
        progress: &mut dyn FnMut(Event),
    ) -> LeagueResult<ResponseBody> {
        debug!("handling {}", command_name(&command));
        match command {
            Command::Init => self.init(),
            Command::NewLeague { team_defs, options } => self.new_league(&team_defs, &options),
            Command::AdvanceWeek => self.advance_week(progress).map(ResponseBody::Week),
            Command::SimToWeek { target_week } => self.sim_to_week(target_week, progress),
            Command::GetSeasonHistory { season } => self.get_season_history(season),
            Command::GetPlayerCareer { player } => self.get_player_career(player),
            Command::GetLeagueLeaders => self.get_league_leaders(),
            Command::SaveNow => self.save_now(),
            Command::ResetLeague => self.reset_league(),
            Command::SetUserTeam { team } => self.set_user_team(team),
            Command::SignPlayer {
                player,
                team,
                contract,
            } => self.sign_player(player, team, contract),
            Command::ReleasePlayer { player, team } => self.release_player(player, team),
            Command::UpdateSettings { patch } => self.update_settings(&patch),
        }
    }

    /// Direct cache access for tests and embedding code running on the owner
    /// thread.
    #[must_use]
    pub fn cache(&self) -> &HotCache {
        &self.cache
    }

    // ── Bootstrap ─────────────────────────────────────────────────────────

    fn init(&mut self) -> LeagueResult<ResponseBody> {
        let Some(meta) = self.stores.meta.load()? else {
            return Ok(ResponseBody::NoSave);
        };

        let season = meta.season;
        let snapshot = LeagueSnapshot {
            meta: Some(meta),
            teams: self.stores.teams.get_all()?,
            players: self.stores.players.get_all()?,
            games: self.stores.games.by_season(season)?,
            season_stats: self
                .stores
                .player_stats
                .by_season(season)?
                .into_iter()
                .map(|row| SeasonStatLine {
                    player_id: row.key.player,
                    team_id: row.team_id,
                    totals: row.totals,
                })
                .collect(),
            draft_picks: self.stores.draft_picks.get_all()?,
        };

        self.cache.hydrate(snapshot);
        info!("hydrated save: season {season}");
        Ok(ResponseBody::League(self.project_league()?))
    }

    fn new_league(
        &mut self,
        team_defs: &[TeamDef],
        options: &LeagueOptions,
    ) -> LeagueResult<ResponseBody> {
        let snapshot = generate::build_league(team_defs, options)?;

        // The new league must be durable before any response goes out, so
        // this bypasses the Flush Coordinator and writes directly.
        self.stores.wipe()?;
        if let Some(meta) = &snapshot.meta {
            self.stores.meta.save(meta)?;
        }
        self.stores.teams.put_bulk(&snapshot.teams)?;
        self.stores.players.put_bulk(&snapshot.players)?;
        self.stores.draft_picks.put_bulk(&snapshot.draft_picks)?;

        self.history.clear();
        self.cache.hydrate(snapshot);
        info!("created league with {} teams", team_defs.len());
        Ok(ResponseBody::League(self.project_league()?))
    }

    // ── Week advancement ──────────────────────────────────────────────────

    fn advance_week(&mut self, progress: &mut dyn FnMut(Event)) -> LeagueResult<WeekOutcome> {
        let meta = self.require_meta()?;

        match meta.phase {
            Phase::Regular => self.play_week(&meta, progress),
            Phase::Playoffs => self.play_championship(&meta, progress),
            Phase::Offseason => self.start_next_season(&meta),
        }
    }

    fn play_week(
        &mut self,
        meta: &LeagueMeta,
        progress: &mut dyn FnMut(Event),
    ) -> LeagueResult<WeekOutcome> {
        if meta.schedule.games.is_empty() {
            return Err(ValidationError::NoGamesScheduled { week: meta.week }.into());
        }

        let week = meta.week;
        let unplayed: Vec<ScheduledGame> = meta
            .schedule
            .week(week)
            .filter(|g| {
                self.cache
                    .game(GameId {
                        season: meta.season,
                        week,
                        home: g.home,
                        away: g.away,
                    })
                    .is_none()
            })
            .copied()
            .collect();

        let results = self.run_games(meta, &unplayed, progress)?;

        let last_week = meta.schedule.last_week().min(meta.settings.season_weeks);
        let regular_season_done = week >= last_week;
        self.cache.update_meta(|m| {
            m.week += 1;
            if regular_season_done {
                m.phase = Phase::Playoffs;
            }
        });

        self.flush.flush(&mut self.cache)?;

        let after = self.require_meta()?;
        Ok(WeekOutcome {
            week,
            results,
            standings: self.standings(),
            next_week: after.week,
            phase: after.phase,
            season_over: false,
        })
    }

    fn play_championship(
        &mut self,
        meta: &LeagueMeta,
        progress: &mut dyn FnMut(Event),
    ) -> LeagueResult<WeekOutcome> {
        let standings = self.standings();
        let (Some(first), Some(second)) = (standings.first(), standings.get(1)) else {
            return Err(ValidationError::NoGamesScheduled { week: meta.week }.into());
        };

        let title_game = ScheduledGame {
            week: meta.week,
            home: first.team_id,
            away: second.team_id,
        };
        let results = self.run_games(meta, &[title_game], progress)?;

        let champion = self
            .cache
            .game(GameId {
                season: meta.season,
                week: meta.week,
                home: title_game.home,
                away: title_game.away,
            })
            .and_then(GameRecord::winner)
            // A tied title game goes to the better seed.
            .or(Some(title_game.home));

        self.archive_season(meta, champion)?;

        self.cache.update_meta(|m| {
            m.phase = Phase::Offseason;
        });
        self.flush.flush(&mut self.cache)?;

        info!(
            "season {} complete, champion: {:?}",
            meta.season, champion
        );

        let after = self.require_meta()?;
        Ok(WeekOutcome {
            week: meta.week,
            results,
            standings: self.standings(),
            next_week: after.week,
            phase: Phase::Offseason,
            season_over: true,
        })
    }

    /// Offseason advance: no games, just the rollover into the next season.
    fn start_next_season(&mut self, meta: &LeagueMeta) -> LeagueResult<WeekOutcome> {
        let new_season = meta.season.next();
        let new_year = meta.year + 1;

        // Age the roster and walk ratings toward (or away from) potential.
        let player_ids: Vec<PlayerId> = self.cache.players().map(|p| p.id).collect();
        for id in player_ids {
            self.cache.update_player(id, |p| {
                p.age = p.age.saturating_add(1);
                if p.age <= 26 {
                    p.overall = (p.overall + 2).min(p.potential);
                } else if p.age >= 30 {
                    p.overall = p.overall.saturating_sub(2).max(40);
                }
            });
        }

        let team_ids: Vec<TeamId> = {
            let mut ids: Vec<TeamId> = self.cache.teams().map(|t| t.id).collect();
            ids.sort_unstable();
            ids
        };
        for &id in &team_ids {
            self.cache.update_team(id, |t| t.record = Default::default());
        }

        // One new draft class enters the horizon.
        let next_pick_id = self.cache.picks().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let mut pick_id = next_pick_id;
        for round in 1..=meta.settings.draft_rounds {
            for &team in &team_ids {
                self.cache.set_pick(DraftPick {
                    id: PickId(pick_id),
                    round,
                    year: new_year + 2,
                    original_owner: team,
                    owner: team,
                    selection: None,
                });
                pick_id += 1;
            }
        }

        let schedule = generate::round_robin(&team_ids, meta.settings.season_weeks);
        self.cache.update_meta(|m| {
            m.season = new_season;
            m.year = new_year;
            m.week = 1;
            m.phase = Phase::Regular;
            m.schedule = schedule;
        });

        self.flush.flush(&mut self.cache)?;
        info!("started season {new_season} ({new_year})");

        Ok(WeekOutcome {
            week: meta.week,
            results: Vec::new(),
            standings: self.standings(),
            next_week: 1,
            phase: Phase::Regular,
            season_over: false,
        })
    }

    /// Resolve `games` through the simulator in batches, applying each
    /// outcome to team records, game records, and stat accumulators.
    fn run_games(
        &mut self,
        meta: &LeagueMeta,
        games: &[ScheduledGame],
        progress: &mut dyn FnMut(Event),
    ) -> LeagueResult<Vec<GameResultView>> {
        let total = games.len();
        let mut results = Vec::with_capacity(total);
        let mut done = 0usize;

        for chunk in games.chunks(self.batch_size) {
            let mut involved: Vec<TeamId> = chunk
                .iter()
                .flat_map(|g| [g.home, g.away])
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            involved.sort_unstable();
            let teams: Vec<SimTeam> = involved
                .iter()
                .filter_map(|&id| {
                    self.cache.team(id).map(|team| SimTeam {
                        team: team.clone(),
                        roster: self
                            .cache
                            .players_by_team(id)
                            .into_iter()
                            .cloned()
                            .collect(),
                    })
                })
                .collect();

            let request = SimRequest {
                season: meta.season,
                year: meta.year,
                week: meta.week,
                teams,
                games: chunk.to_vec(),
            };
            let outcomes = self.sim.simulate(&request);

            for outcome in outcomes {
                self.cache.update_team(outcome.home, |t| {
                    t.record.apply_result(outcome.home_score, outcome.away_score);
                });
                self.cache.update_team(outcome.away, |t| {
                    t.record.apply_result(outcome.away_score, outcome.home_score);
                });

                let id = GameId {
                    season: meta.season,
                    week: meta.week,
                    home: outcome.home,
                    away: outcome.away,
                };
                self.cache.push_game(GameRecord {
                    id,
                    home_score: outcome.home_score,
                    away_score: outcome.away_score,
                    box_score: outcome.box_score.clone(),
                });

                for (player_id, delta) in &outcome.player_stats {
                    let Some(team) = self
                        .cache
                        .player(*player_id)
                        .and_then(|p| p.team_id)
                    else {
                        continue;
                    };
                    self.cache.update_season_stat(*player_id, team, delta);
                }

                results.push(GameResultView {
                    id: id.to_string(),
                    week: meta.week,
                    home: outcome.home,
                    home_abbr: self.abbr(outcome.home),
                    home_score: outcome.home_score,
                    away: outcome.away,
                    away_abbr: self.abbr(outcome.away),
                    away_score: outcome.away_score,
                });
                done += 1;
            }

            progress(Event::SimProgress { done, total });
        }

        Ok(results)
    }

    /// Fold the finished season into durable history: summary, archived stat
    /// rows, career totals. The Hot Cache keeps only what the next season
    /// needs.
    fn archive_season(&mut self, meta: &LeagueMeta, champion: Option<TeamId>) -> LeagueResult<()> {
        let lines = self.cache.take_season_stats();

        let awards = season_awards(&lines);
        let summary = SeasonSummary {
            season: meta.season,
            year: meta.year,
            champion,
            standings: self.standings(),
            awards,
        };

        // Boundary writes go straight to the store; the accumulators are
        // gone from the cache and must not depend on a later flush.
        let rows: Vec<PlayerSeasonStat> = lines
            .iter()
            .map(|line| PlayerSeasonStat::from_line(meta.season, line))
            .collect();
        self.stores.player_stats.put_bulk(&rows)?;
        self.stores.seasons.put(&summary)?;
        self.history.put(summary);

        for line in &lines {
            self.cache.update_player(line.player_id, |p| {
                p.career.fold(&line.totals);
            });
        }

        self.cache.prune_games();
        Ok(())
    }

    fn sim_to_week(
        &mut self,
        target_week: u32,
        progress: &mut dyn FnMut(Event),
    ) -> LeagueResult<ResponseBody> {
        let meta = self.require_meta()?;
        if meta.phase != Phase::Offseason && target_week <= meta.week {
            return Err(ValidationError::TargetWeekNotAhead {
                target: target_week,
                current: meta.week,
            }
            .into());
        }

        // Each week's apply-and-flush completes before the next begins;
        // write ordering across weeks is preserved by construction.
        loop {
            let outcome = self.advance_week(progress)?;
            if outcome.season_over {
                break;
            }
            let meta = self.require_meta()?;
            if meta.phase == Phase::Regular && meta.week >= target_week {
                break;
            }
        }

        Ok(ResponseBody::League(self.project_league()?))
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    fn get_season_history(&mut self, season: SeasonId) -> LeagueResult<ResponseBody> {
        if let Some(summary) = self.history.get(season) {
            return Ok(ResponseBody::SeasonHistory {
                season,
                data: Some(summary.clone()),
            });
        }

        let data = self.stores.seasons.get(season)?;
        if let Some(summary) = &data {
            self.history.put(summary.clone());
        }
        Ok(ResponseBody::SeasonHistory { season, data })
    }

    fn get_player_career(&mut self, player_id: PlayerId) -> LeagueResult<ResponseBody> {
        let player = match self.cache.player(player_id) {
            Some(p) => p.clone(),
            None => self
                .stores
                .players
                .get(player_id)?
                .ok_or(NotFoundError::Player(player_id))?,
        };

        let mut stats = self.stores.player_stats.by_player(player_id)?;

        // The live accumulator is fresher than any mid-season flushed row.
        if let (Some(meta), Some(line)) = (self.cache.meta(), self.cache.season_stat(player_id)) {
            let live = PlayerSeasonStat::from_line(meta.season, line);
            match stats.iter_mut().find(|r| r.key == live.key) {
                Some(row) => *row = live,
                None => stats.push(live),
            }
        }
        stats.sort_by_key(|r| r.key);

        Ok(ResponseBody::PlayerCareer {
            player: self.player_view(&player),
            stats,
        })
    }

    fn get_league_leaders(&mut self) -> LeagueResult<ResponseBody> {
        let meta = self.require_meta()?;

        // Live accumulators first; archived rows fill in anyone missing.
        let mut merged: HashMap<PlayerId, (TeamId, StatTotals)> = self
            .cache
            .season_stats()
            .map(|line| (line.player_id, (line.team_id, line.totals)))
            .collect();
        for row in self.stores.player_stats.by_season(meta.season)? {
            merged
                .entry(row.key.player)
                .or_insert((row.team_id, row.totals));
        }

        let mut entries = Vec::with_capacity(merged.len());
        for (player_id, (stat_team, totals)) in merged {
            let player = match self.cache.player(player_id) {
                Some(p) => p.clone(),
                None => match self.stores.players.get(player_id)? {
                    Some(p) => p,
                    None => continue,
                },
            };
            let team_id = player.team_id.or(Some(stat_team));
            entries.push((player, team_id, totals));
        }

        let top = |pred: &dyn Fn(Position) -> bool, value: &dyn Fn(&StatTotals) -> u32| {
            let mut rows: Vec<LeaderRow> = entries
                .iter()
                .filter(|(p, _, totals)| pred(p.pos) && value(totals) > 0)
                .map(|(p, team_id, totals)| LeaderRow {
                    player_id: p.id,
                    name: p.name.clone(),
                    pos: p.pos,
                    team_id: *team_id,
                    team_abbr: team_id.map_or_else(|| "FA".to_string(), |t| self.abbr(t)),
                    value: value(totals),
                })
                .collect();
            rows.sort_by(|a, b| b.value.cmp(&a.value).then(a.player_id.cmp(&b.player_id)));
            rows.truncate(5);
            rows
        };

        Ok(ResponseBody::Leaders(LeagueLeaders {
            passing: top(&|pos| pos == Position::QB, &|t| t.pass_yd),
            rushing: top(&|pos| pos == Position::RB, &|t| t.rush_yd),
            receiving: top(
                &|pos| matches!(pos, Position::WR | Position::TE | Position::RB),
                &|t| t.rec_yd,
            ),
        }))
    }

    // ── Persistence commands ──────────────────────────────────────────────

    fn save_now(&mut self) -> LeagueResult<ResponseBody> {
        self.flush.flush(&mut self.cache)?;
        Ok(ResponseBody::Saved)
    }

    fn reset_league(&mut self) -> LeagueResult<ResponseBody> {
        self.stores.wipe()?;
        self.cache.reset();
        self.history.clear();
        info!("save destroyed");
        Ok(ResponseBody::NoSave)
    }

    // ── Entity mutations ──────────────────────────────────────────────────

    fn set_user_team(&mut self, team: TeamId) -> LeagueResult<ResponseBody> {
        self.require_meta()?;
        if self.cache.team(team).is_none() {
            return Err(NotFoundError::Team(team).into());
        }

        self.cache.update_meta(|m| m.user_team_id = Some(team));
        self.flush.flush(&mut self.cache)?;
        Ok(ResponseBody::UserTeam {
            team: self.team_view_of(team)?,
        })
    }

    fn sign_player(
        &mut self,
        player_id: PlayerId,
        team: TeamId,
        contract: Contract,
    ) -> LeagueResult<ResponseBody> {
        self.require_meta()?;
        let player = self
            .cache
            .player(player_id)
            .ok_or(NotFoundError::Player(player_id))?;
        if let Some(current) = player.team_id {
            return Err(ValidationError::PlayerAlreadySigned {
                player: player_id,
                team: current,
            }
            .into());
        }
        if self.cache.team(team).is_none() {
            return Err(NotFoundError::Team(team).into());
        }

        self.cache.update_player(player_id, |p| {
            p.team_id = Some(team);
            p.contract = Some(contract);
        });
        self.cache.recompute_team_cap(team);
        self.flush.flush(&mut self.cache)?;

        Ok(ResponseBody::Roster(self.roster_slice(team, player_id)?))
    }

    fn release_player(&mut self, player_id: PlayerId, team: TeamId) -> LeagueResult<ResponseBody> {
        self.require_meta()?;
        let player = self
            .cache
            .player(player_id)
            .ok_or(NotFoundError::Player(player_id))?;
        if player.team_id != Some(team) {
            return Err(ValidationError::PlayerNotOnTeam {
                player: player_id,
                team,
            }
            .into());
        }

        // Release keeps the player record; only the rights go away.
        self.cache.update_player(player_id, |p| {
            p.team_id = None;
            p.contract = None;
        });
        self.cache.recompute_team_cap(team);
        self.flush.flush(&mut self.cache)?;

        Ok(ResponseBody::Roster(self.roster_slice(team, player_id)?))
    }

    fn update_settings(&mut self, patch: &SettingsPatch) -> LeagueResult<ResponseBody> {
        let meta = self.require_meta()?;

        let mut settings = meta.settings;
        patch.apply_to(&mut settings)?;

        self.cache.update_meta(|m| m.settings = settings);
        self.flush.flush(&mut self.cache)?;
        Ok(ResponseBody::Settings(settings))
    }

    // ── Projection helpers ────────────────────────────────────────────────

    fn require_meta(&self) -> LeagueResult<LeagueMeta> {
        self.cache
            .meta()
            .cloned()
            .ok_or_else(|| LeagueError::from(ValidationError::NoLeagueLoaded))
    }

    fn abbr(&self, team: TeamId) -> String {
        self.cache
            .team(team)
            .map_or_else(|| team.to_string(), |t| t.abbr.clone())
    }

    /// Standings snapshot: best record first, points difference breaking
    /// ties, team id keeping the order stable.
    fn standings(&self) -> Vec<StandingRow> {
        let mut rows: Vec<StandingRow> = self
            .cache
            .teams()
            .map(|t| StandingRow {
                team_id: t.id,
                abbr: t.abbr.clone(),
                wins: t.record.wins,
                losses: t.record.losses,
                ties: t.record.ties,
                points_for: t.record.points_for,
                points_against: t.record.points_against,
            })
            .collect();

        rows.sort_by(|a, b| {
            let pct = |r: &StandingRow| {
                let played = r.wins + r.losses + r.ties;
                if played == 0 {
                    0.0
                } else {
                    (f64::from(r.wins) + f64::from(r.ties) * 0.5) / f64::from(played)
                }
            };
            pct(b)
                .partial_cmp(&pct(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let diff = |r: &StandingRow| i64::from(r.points_for) - i64::from(r.points_against);
                    diff(b).cmp(&diff(a))
                })
                .then_with(|| a.team_id.cmp(&b.team_id))
        });
        rows
    }

    fn team_view_of(&self, id: TeamId) -> LeagueResult<TeamView> {
        let cap_limit = self.require_meta()?.settings.salary_cap;
        let team = self.cache.team(id).ok_or(NotFoundError::Team(id))?;
        Ok(TeamView {
            id: team.id,
            name: team.name.clone(),
            abbr: team.abbr.clone(),
            conference: team.conference.clone(),
            division: team.division.clone(),
            wins: team.record.wins,
            losses: team.record.losses,
            ties: team.record.ties,
            points_for: team.record.points_for,
            points_against: team.record.points_against,
            cap_used: team.cap_used,
            cap_limit,
        })
    }

    fn player_view(&self, player: &crate::player::Player) -> PlayerView {
        PlayerView {
            id: player.id,
            name: player.name.clone(),
            pos: player.pos,
            age: player.age,
            overall: player.overall,
            team_id: player.team_id,
            salary: player.contract.map(|c| c.salary),
            years: player.contract.map(|c| c.years),
        }
    }

    fn roster_slice(&self, team: TeamId, player_id: PlayerId) -> LeagueResult<RosterSlice> {
        let player = self
            .cache
            .player(player_id)
            .ok_or(NotFoundError::Player(player_id))?;
        Ok(RosterSlice {
            team: self.team_view_of(team)?,
            player: self.player_view(player),
        })
    }

    fn project_league(&self) -> LeagueResult<LeagueProjection> {
        let meta = self.require_meta()?;
        let mut teams: Vec<TeamView> = self
            .cache
            .teams()
            .map(|t| t.id)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|id| self.team_view_of(id))
            .collect::<LeagueResult<_>>()?;
        teams.sort_by_key(|t| t.id);

        Ok(LeagueProjection {
            season: meta.season,
            year: meta.year,
            week: meta.week,
            phase: meta.phase,
            user_team_id: meta.user_team_id,
            settings: meta.settings,
            teams,
            standings: self.standings(),
        })
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init => "INIT",
        Command::NewLeague { .. } => "NEW_LEAGUE",
        Command::AdvanceWeek => "ADVANCE_WEEK",
        Command::SimToWeek { .. } => "SIM_TO_WEEK",
        Command::GetSeasonHistory { .. } => "GET_SEASON_HISTORY",
        Command::GetPlayerCareer { .. } => "GET_PLAYER_CAREER",
        Command::GetLeagueLeaders => "GET_LEAGUE_LEADERS",
        Command::SaveNow => "SAVE_NOW",
        Command::ResetLeague => "RESET_LEAGUE",
        Command::SetUserTeam { .. } => "SET_USER_TEAM",
        Command::SignPlayer { .. } => "SIGN_PLAYER",
        Command::ReleasePlayer { .. } => "RELEASE_PLAYER",
        Command::UpdateSettings { .. } => "UPDATE_SETTINGS",
    }
}

fn season_awards(lines: &[SeasonStatLine]) -> Vec<Award> {
    let mut awards = Vec::new();
    let mut push = |name: &str, value: &dyn Fn(&StatTotals) -> u32| {
        if let Some(line) = lines
            .iter()
            .filter(|l| value(&l.totals) > 0)
            .max_by_key(|l| (value(&l.totals), std::cmp::Reverse(l.player_id)))
        {
            awards.push(Award {
                name: name.to_string(),
                player_id: line.player_id,
                value: value(&line.totals),
            });
        }
    };

    push("Passing Yards Leader", &|t| t.pass_yd);
    push("Rushing Yards Leader", &|t| t.rush_yd);
    push("Receiving Yards Leader", &|t| t.rec_yd);
    awards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStores;

    fn defs(n: usize) -> Vec<TeamDef> {
        (0..n)
            .map(|i| TeamDef {
                name: format!("City {i}"),
                abbr: format!("C{i}"),
                conference: "East".to_string(),
                division: "North".to_string(),
            })
            .collect()
    }

    fn service() -> LeagueService {
        LeagueService::new(
            InMemoryStores::handles(),
            Box::new(crate::sim::RatingSimulator),
            ServiceConfig::default(),
        )
    }

    fn no_progress() -> impl FnMut(Event) {
        |_| {}
    }

    #[test]
    fn commands_before_a_league_exists_are_validation_errors() {
        let mut svc = service();
        let err = svc
            .handle(Command::AdvanceWeek, &mut no_progress())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn init_without_a_save_reports_no_save() {
        let mut svc = service();
        let body = svc.handle(Command::Init, &mut no_progress()).unwrap();
        assert!(matches!(body, ResponseBody::NoSave));
    }

    #[test]
    fn new_league_is_durable_before_the_response() {
        let stores = InMemoryStores::handles();
        let mut svc = LeagueService::new(
            stores.clone(),
            Box::new(crate::sim::RatingSimulator),
            ServiceConfig::default(),
        );

        let body = svc
            .handle(
                Command::NewLeague {
                    team_defs: defs(4),
                    options: LeagueOptions::default(),
                },
                &mut no_progress(),
            )
            .unwrap();

        assert!(matches!(body, ResponseBody::League(_)));
        // Already persisted, independent of any later flush.
        assert!(stores.meta.load().unwrap().is_some());
        assert_eq!(stores.teams.get_all().unwrap().len(), 4);
        assert!(!stores.players.get_all().unwrap().is_empty());
    }

    #[test]
    fn sign_then_release_round_trips_to_free_agency() {
        let mut svc = service();
        svc.handle(
            Command::NewLeague {
                team_defs: defs(2),
                options: LeagueOptions::default(),
            },
            &mut no_progress(),
        )
        .unwrap();

        // Release someone to create a free agent.
        let rostered = svc
            .cache()
            .players_by_team(TeamId(0))
            .first()
            .map(|p| p.id)
            .unwrap();
        let body = svc
            .handle(
                Command::ReleasePlayer {
                    player: rostered,
                    team: TeamId(0),
                },
                &mut no_progress(),
            )
            .unwrap();
        let ResponseBody::Roster(slice) = body else {
            panic!("expected roster slice");
        };
        assert_eq!(slice.player.team_id, None);
        assert_eq!(slice.player.salary, None);

        // Sign them to the other team; cap usage follows the contract.
        let cap_before = svc.cache().team(TeamId(1)).unwrap().cap_used;
        let body = svc
            .handle(
                Command::SignPlayer {
                    player: rostered,
                    team: TeamId(1),
                    contract: Contract {
                        salary: 7_500_000,
                        years: 3,
                    },
                },
                &mut no_progress(),
            )
            .unwrap();
        let ResponseBody::Roster(slice) = body else {
            panic!("expected roster slice");
        };
        assert_eq!(slice.player.team_id, Some(TeamId(1)));
        assert_eq!(slice.team.cap_used, cap_before + 7_500_000);
    }

    #[test]
    fn signing_a_rostered_player_is_rejected() {
        let mut svc = service();
        svc.handle(
            Command::NewLeague {
                team_defs: defs(2),
                options: LeagueOptions::default(),
            },
            &mut no_progress(),
        )
        .unwrap();

        let rostered = svc
            .cache()
            .players_by_team(TeamId(0))
            .first()
            .map(|p| p.id)
            .unwrap();
        let err = svc
            .handle(
                Command::SignPlayer {
                    player: rostered,
                    team: TeamId(1),
                    contract: Contract {
                        salary: 1,
                        years: 1,
                    },
                },
                &mut no_progress(),
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn update_settings_applies_declared_fields_only() {
        let mut svc = service();
        svc.handle(
            Command::NewLeague {
                team_defs: defs(2),
                options: LeagueOptions::default(),
            },
            &mut no_progress(),
        )
        .unwrap();

        let weeks_before = svc.cache().meta().unwrap().settings.season_weeks;
        let body = svc
            .handle(
                Command::UpdateSettings {
                    patch: SettingsPatch {
                        salary_cap: Some(90_000_000),
                        ..SettingsPatch::default()
                    },
                },
                &mut no_progress(),
            )
            .unwrap();

        let ResponseBody::Settings(settings) = body else {
            panic!("expected settings");
        };
        assert_eq!(settings.salary_cap, 90_000_000);
        assert_eq!(settings.season_weeks, weeks_before);
    }

    #[test]
    fn season_awards_pick_the_yardage_leaders() {
        let lines = vec![
            SeasonStatLine {
                player_id: PlayerId(1),
                team_id: TeamId(0),
                totals: StatTotals {
                    pass_yd: 4000,
                    ..StatTotals::default()
                },
            },
            SeasonStatLine {
                player_id: PlayerId(2),
                team_id: TeamId(1),
                totals: StatTotals {
                    pass_yd: 4800,
                    rush_yd: 300,
                    ..StatTotals::default()
                },
            },
        ];

        let awards = season_awards(&lines);
        assert_eq!(awards.len(), 2); // nobody caught a pass
        assert_eq!(awards[0].player_id, PlayerId(2));
        assert_eq!(awards[0].value, 4800);
        assert_eq!(awards[1].name, "Rushing Yards Leader");
    }
}
