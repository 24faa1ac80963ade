//! Durable Store: schema-defined persistent collections behind storage
//! traits.
//!
//! Schema (collection → key → secondary indexes):
//! - `meta` → singleton
//! - `teams` → team id
//! - `players` → player id; indexed by team and position
//! - `games` → `"s1_w1_0_1"`; indexed by season and week
//! - `seasons` → `"s1"`; indexed by year
//! - `player_stats` → `"s1_p4"`; indexed by season and player
//! - `draft_picks` → pick id; indexed by current owner and year
//!
//! The in-memory backend serves tests and ephemeral leagues; the persistent
//! backend (feature `persistent`) adds WAL-based crash safety.

pub mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::InMemoryStores;
pub use traits::{
    DraftPickStore, GameStore, MetaStore, PlayerStatStore, PlayerStore, SeasonStore, StorageError,
    StoreHandles, TeamStore,
};

#[cfg(feature = "persistent")]
pub use persistent::{open_database, PersistentConfig, PersistentStores};
