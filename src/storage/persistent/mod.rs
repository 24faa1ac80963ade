//! Persistent storage backend.
//!
//! Durable, crash-safe storage with:
//! - Write-Ahead Logging (WAL) for crash recovery
//! - File locking for single-process access
//! - CRC32 checksums for corruption detection
//! - Segment files holding compacted whole-league snapshots
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  PersistentStores                     │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌──────────────────┐           │
//! │  │ WriteAheadLog  │   │  SegmentManager  │           │
//! │  │ (append-only)  │   │ (checkpointed    │           │
//! │  │                │   │  snapshots)      │           │
//! │  └───────┬────────┘   └────────┬─────────┘           │
//! │          └──────────┬──────────┘                     │
//! │                     ↓                                │
//! │          ┌─────────────────────┐                     │
//! │          │  FileLock (flock)   │                     │
//! │          └─────────────────────┘                     │
//! └──────────────────────────────────────────────────────┘
//! ```

mod codec;
mod file_lock;
mod segment;
mod stores;
mod wal;

pub use file_lock::FileLock;
pub use segment::{Segment, SegmentData, SegmentManager};
pub use stores::{CompactionResult, PersistentStores};
pub use wal::{WalEntry, WalEntryKind, WriteAheadLog};

use std::path::Path;

use crate::storage::StorageError;

/// Configuration for persistent storage.
#[derive(Debug, Clone, Copy)]
pub struct PersistentConfig {
    /// WAL size that triggers compaction on the next open (bytes).
    pub max_wal_size: u64,
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            max_wal_size: 16 * 1024 * 1024, // 16 MB
            sync_on_write: true,
        }
    }
}

impl PersistentConfig {
    const MIN_WAL_SIZE: u64 = 4 * 1024; // 4 KiB minimum to avoid degenerate compaction loops

    /// Check the configuration for degenerate values.
    pub fn validate(self) -> Result<Self, StorageError> {
        if self.max_wal_size < Self::MIN_WAL_SIZE {
            return Err(StorageError::Backend(format!(
                "max_wal_size must be at least {} bytes (got {})",
                Self::MIN_WAL_SIZE,
                self.max_wal_size
            )));
        }

        Ok(self)
    }
}

/// Open or create a persistent save at the given path.
///
/// # Arguments
/// * `path` - Directory to store the save files
/// * `config` - Optional configuration (defaults if `None`)
///
/// # Errors
/// - The path cannot be created or accessed
/// - Another process holds the lock
/// - WAL replay fails due to corruption
pub fn open_database(
    path: impl AsRef<Path>,
    config: Option<PersistentConfig>,
) -> Result<PersistentStores, StorageError> {
    let cfg = config.unwrap_or_default().validate()?;
    PersistentStores::open(path.as_ref(), cfg)
}
