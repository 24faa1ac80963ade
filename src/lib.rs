//! # gridiron - league simulation state engine
//!
//! gridiron owns every entity of a season-based league save (teams, rosters,
//! season statistics, draft assets, game results, historical archives),
//! mirrors the current season in an in-memory Hot Cache, and persists
//! mutations to a schema-defined Durable Store. The presentation layer never
//! touches any of it directly: it talks to the [`router::runtime::LeagueRuntime`]
//! through typed commands and receives projections back.
//!
//! ## Core pieces
//!
//! - **Hot Cache** ([`cache::HotCache`]): the current season's working set;
//!   every mutation marks its key in the Dirty Tracker
//! - **Flush Coordinator** ([`flush::FlushCoordinator`]): drains the dirty
//!   set and bulk-writes it to the store
//! - **History Cache** ([`cache::HistoryCache`]): bounded LRU over archived
//!   season summaries
//! - **Durable Store** ([`storage`]): in-memory and WAL-backed persistent
//!   backends behind per-collection traits
//! - **Command Router** ([`router`]): the message boundary, one owner thread
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gridiron::router::runtime::{LeagueRuntime, RuntimeConfig};
//! use gridiron::router::Command;
//! use gridiron::sim::RatingSimulator;
//! use gridiron::storage::open_database;
//!
//! let stores = open_database("./save.league", None)?;
//! let runtime = LeagueRuntime::start(
//!     stores.handles(),
//!     Box::new(RatingSimulator),
//!     RuntimeConfig::default(),
//! );
//!
//! let response = runtime.request(Command::Init)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Domain types
pub mod draft;
pub mod error;
pub mod game;
pub mod meta;
pub mod player;
pub mod season;
pub mod stats;
pub mod team;

// State management
pub mod cache;
pub mod flush;
pub mod storage;

// Boundary and collaborators
pub mod generate;
pub mod router;
pub mod sim;

// Re-export primary types at crate root for convenience
pub use cache::{DirtyKind, DirtySnapshot, HistoryCache, HotCache, LeagueSnapshot};
pub use draft::{DraftPick, PickId};
pub use error::{LeagueError, LeagueResult, NotFoundError, ProtocolError, ValidationError};
pub use flush::{FlushCoordinator, FlushReport};
pub use game::{GameId, GameRecord};
pub use meta::{LeagueMeta, LeagueSettings, Phase, ScheduledGame, SettingsPatch, SlimSchedule};
pub use player::{Contract, Player, PlayerId, Position};
pub use season::{Award, SeasonId, SeasonSummary, StandingRow};
pub use stats::{PlayerSeasonStat, SeasonStatLine, StatDelta, StatKey, StatTotals};
pub use storage::{InMemoryStores, StorageError, StoreHandles};
pub use team::{Team, TeamId, TeamRecord};
