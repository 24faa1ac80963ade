//! Error types for gridiron.
//!
//! All errors are strongly typed using thiserror. Every handler failure is
//! caught at the command-router boundary and converted into a typed error
//! response; nothing propagates to the presentation layer as a panic.

use thiserror::Error;

use crate::player::PlayerId;
use crate::season::SeasonId;
use crate::storage::StorageError;
use crate::team::TeamId;

/// Validation errors raised before a command mutates any state.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A command that requires a loaded league arrived before INIT/NEW_LEAGUE.
    #[error("no league is loaded")]
    NoLeagueLoaded,

    /// A new league was requested with too few team definitions.
    #[error("a league needs at least 2 teams, got {count}")]
    TooFewTeams {
        /// Number of team definitions supplied.
        count: usize,
    },

    /// Week advancement found nothing to play.
    #[error("no games scheduled for week {week}")]
    NoGamesScheduled {
        /// The week that had no schedule entries.
        week: u32,
    },

    /// SIM_TO_WEEK asked for a week that is not ahead of the current one.
    #[error("target week {target} is not ahead of current week {current}")]
    TargetWeekNotAhead {
        /// Requested target week.
        target: u32,
        /// Week the league is currently on.
        current: u32,
    },

    /// Sign attempted on a player who is already under contract.
    #[error("player {player} is already on team {team}")]
    PlayerAlreadySigned {
        /// The player being signed.
        player: PlayerId,
        /// The team currently holding the contract.
        team: TeamId,
    },

    /// Release attempted for a player not rostered by the given team.
    #[error("player {player} is not on team {team}")]
    PlayerNotOnTeam {
        /// The player being released.
        player: PlayerId,
        /// The team that claimed to hold them.
        team: TeamId,
    },

    /// A settings patch carried a value outside its accepted range.
    #[error("invalid setting '{field}': {reason}")]
    InvalidSetting {
        /// Settings field that failed validation.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Protocol errors raised at the channel boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The bounded command queue was full.
    #[error("command queue is full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The owner thread has shut down.
    #[error("league runtime has shut down")]
    Disconnected,
}

/// Referenced entity was absent from both the Hot Cache and the Durable Store.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// No team with the given id.
    #[error("team {0} not found")]
    Team(TeamId),

    /// No player with the given id.
    #[error("player {0} not found")]
    Player(PlayerId),

    /// No archived summary for the given season.
    #[error("season {0} not found")]
    Season(SeasonId),
}

/// Top-level error type for gridiron.
#[derive(Debug, Error)]
pub enum LeagueError {
    /// Input validation failed; no state was mutated.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// A Durable Store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The command channel rejected the request.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl LeagueError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Short machine-readable kind tag, used by error responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::Protocol(_) => "protocol",
        }
    }
}

/// Result type alias for gridiron operations.
pub type LeagueResult<T> = Result<T, LeagueError>;
