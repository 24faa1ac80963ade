//! The Command Router: the sole boundary between the league state and the
//! outside world.
//!
//! The presentation layer submits typed [`Command`]s and receives typed
//! [`Response`]s carrying minimal view-model projections, never the internal
//! entities. Unsolicited [`Event`]s (simulation progress) flow on a separate
//! channel. All state lives on the runtime's owner thread; see
//! [`runtime::LeagueRuntime`].

mod handlers;

/// Channel-based runtime owning the league state.
pub mod runtime;

pub use handlers::{LeagueService, ServiceConfig};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generate::{LeagueOptions, TeamDef};
use crate::meta::{LeagueSettings, Phase, SettingsPatch};
use crate::player::{Contract, PlayerId, Position};
use crate::season::{SeasonId, SeasonSummary, StandingRow};
use crate::stats::PlayerSeasonStat;
use crate::team::TeamId;

/// Request/response pairing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Mint a fresh correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every operation the presentation layer may invoke.
///
/// A tagged union instead of a string-keyed dispatch table: the compiler
/// enforces exhaustive handling and the payload shape per command.
#[derive(Debug, Clone)]
pub enum Command {
    /// Detect an existing save and hydrate it.
    Init,
    /// Wipe the store and build a fresh league.
    NewLeague {
        /// Franchise definitions.
        team_defs: Vec<TeamDef>,
        /// League options.
        options: LeagueOptions,
    },
    /// Play the current week.
    AdvanceWeek,
    /// Play forward to the given week (or the end of the season).
    SimToWeek {
        /// Week to stop at.
        target_week: u32,
    },
    /// Read one archived season.
    GetSeasonHistory {
        /// Season to fetch.
        season: SeasonId,
    },
    /// Read a player's career, live season included.
    GetPlayerCareer {
        /// Player to fetch.
        player: PlayerId,
    },
    /// Current-season statistical leaders.
    GetLeagueLeaders,
    /// Flush everything dirty now.
    SaveNow,
    /// Destroy the save.
    ResetLeague,
    /// Choose the user-controlled team.
    SetUserTeam {
        /// The team.
        team: TeamId,
    },
    /// Sign a free agent.
    SignPlayer {
        /// The player to sign.
        player: PlayerId,
        /// The signing team.
        team: TeamId,
        /// Contract terms.
        contract: Contract,
    },
    /// Release a player to free agency.
    ReleasePlayer {
        /// The player to release.
        player: PlayerId,
        /// The team releasing them.
        team: TeamId,
    },
    /// Patch the league settings.
    UpdateSettings {
        /// Declared-fields-only settings update.
        patch: SettingsPatch,
    },
}

/// A correlated command.
#[derive(Debug, Clone)]
pub struct Request {
    /// Pairing key echoed on the response.
    pub correlation_id: CorrelationId,
    /// The operation.
    pub command: Command,
}

impl Request {
    /// Wrap a command with a fresh correlation id.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            command,
        }
    }
}

// ── Projections ───────────────────────────────────────────────────────────

/// Team slice handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct TeamView {
    /// Team id.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Abbreviation.
    pub abbr: String,
    /// Conference.
    pub conference: String,
    /// Division.
    pub division: String,
    /// Wins.
    pub wins: u32,
    /// Losses.
    pub losses: u32,
    /// Ties.
    pub ties: u32,
    /// Points scored.
    pub points_for: u32,
    /// Points conceded.
    pub points_against: u32,
    /// Salary committed to the roster.
    pub cap_used: u64,
    /// League salary cap.
    pub cap_limit: u64,
}

/// Player slice handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Position.
    pub pos: Position,
    /// Age.
    pub age: u8,
    /// Overall rating.
    pub overall: u8,
    /// Rostering team, if any.
    pub team_id: Option<TeamId>,
    /// Salary, when under contract.
    pub salary: Option<u64>,
    /// Remaining contract years, when under contract.
    pub years: Option<u8>,
}

/// One finished game in a week outcome.
#[derive(Debug, Clone, Serialize)]
pub struct GameResultView {
    /// Durable game key, e.g. `"s1_w1_0_1"`.
    pub id: String,
    /// Week played.
    pub week: u32,
    /// Home team.
    pub home: TeamId,
    /// Home abbreviation.
    pub home_abbr: String,
    /// Home score.
    pub home_score: u32,
    /// Away team.
    pub away: TeamId,
    /// Away abbreviation.
    pub away_abbr: String,
    /// Away score.
    pub away_score: u32,
}

/// Full-state projection: what INIT and NEW_LEAGUE answer with.
#[derive(Debug, Clone, Serialize)]
pub struct LeagueProjection {
    /// Current season.
    pub season: SeasonId,
    /// Calendar year.
    pub year: u32,
    /// Week about to be played.
    pub week: u32,
    /// Phase within the season.
    pub phase: Phase,
    /// User-controlled team.
    pub user_team_id: Option<TeamId>,
    /// League settings.
    pub settings: LeagueSettings,
    /// All teams with records.
    pub teams: Vec<TeamView>,
    /// Standings, best record first.
    pub standings: Vec<StandingRow>,
}

/// Result of playing one week.
#[derive(Debug, Clone, Serialize)]
pub struct WeekOutcome {
    /// The week that was played.
    pub week: u32,
    /// Final scores.
    pub results: Vec<GameResultView>,
    /// Standings after the week.
    pub standings: Vec<StandingRow>,
    /// Week the league moved to.
    pub next_week: u32,
    /// Phase the league moved to.
    pub phase: Phase,
    /// True when this advance completed a season.
    pub season_over: bool,
}

/// One leader-board row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderRow {
    /// Player.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Position.
    pub pos: Position,
    /// Rostering team, if any.
    pub team_id: Option<TeamId>,
    /// Team abbreviation, `"FA"` for free agents.
    pub team_abbr: String,
    /// The stat value being ranked.
    pub value: u32,
}

/// Current-season statistical leaders.
#[derive(Debug, Clone, Serialize, Default)]
pub struct LeagueLeaders {
    /// Passing-yardage leaders (quarterbacks).
    pub passing: Vec<LeaderRow>,
    /// Rushing-yardage leaders (running backs).
    pub rushing: Vec<LeaderRow>,
    /// Receiving-yardage leaders (receivers, tight ends, backs).
    pub receiving: Vec<LeaderRow>,
}

/// Affected slice after a roster mutation.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSlice {
    /// The team whose roster changed.
    pub team: TeamView,
    /// The player that moved.
    pub player: PlayerView,
}

/// Typed response payloads, one per command family.
#[derive(Debug, Clone, Serialize)]
pub enum ResponseBody {
    /// No save exists yet.
    NoSave,
    /// Full-state projection.
    League(LeagueProjection),
    /// Week outcome.
    Week(WeekOutcome),
    /// One archived season, if it exists.
    SeasonHistory {
        /// The requested season.
        season: SeasonId,
        /// The archived summary, `None` when never archived.
        data: Option<SeasonSummary>,
    },
    /// A player's career.
    PlayerCareer {
        /// The player.
        player: PlayerView,
        /// Per-season rows, current season included.
        stats: Vec<PlayerSeasonStat>,
    },
    /// Current-season leaders.
    Leaders(LeagueLeaders),
    /// Flush acknowledged.
    Saved,
    /// User team changed.
    UserTeam {
        /// The chosen team.
        team: TeamView,
    },
    /// Roster mutation applied.
    Roster(RosterSlice),
    /// Settings after an update.
    Settings(LeagueSettings),
    /// A handler failed; nothing propagates as a panic.
    Error {
        /// Machine-readable kind: `validation`, `not_found`, `storage`,
        /// `protocol`.
        kind: String,
        /// Human-readable message.
        message: String,
    },
}

/// A correlated response.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// Pairing key from the originating request.
    pub correlation_id: CorrelationId,
    /// Payload.
    pub body: ResponseBody,
}

/// Unsolicited messages pushed while a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Event {
    /// Batched-simulation progress.
    SimProgress {
        /// Games resolved so far.
        done: usize,
        /// Games in the week.
        total: usize,
    },
}
