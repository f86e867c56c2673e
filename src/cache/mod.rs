//! Disk caching: a sharded LRU byte store and the DataFrame adapter on top.

pub mod disk;
pub mod frame;

pub use disk::{CacheConfig, CacheStats, DiskCache};
pub use frame::{FrameCache, SaveOutcome};
