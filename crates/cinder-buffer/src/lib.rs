//! Buffer pool management for CinderDB.
//!
//! This crate provides in-memory page caching with:
//! - Fixed-size buffer pool with configurable frame count
//! - LRU-K eviction policy for cache management
//! - Extendible hash table as the page id to frame id directory
//! - Pin counting for concurrent access
//! - Dirty page tracking with write-back on eviction

mod disk;
mod frame;
mod hashtable;
mod pool;
mod replacer;
mod wal;

pub use disk::{DiskManager, FileDiskManager, FileDiskManagerConfig};
pub use frame::{Frame, FrameId};
pub use hashtable::ExtendibleHashTable;
pub use pool::{BufferPool, BufferPoolConfig, BufferPoolStats};
pub use replacer::{LruKReplacer, Replacer};
pub use wal::{LogManager, Lsn, MemoryLogManager};
