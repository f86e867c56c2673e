//! Marketlab — thin data-access layer for market-data providers.
//!
//! Three pieces, composed top-down:
//! - Provider abstraction: [`MarketDataProvider`] plus the shared DTOs
//!   ([`SymbolInfo`], [`Quote`], [`OhlcvBar`])
//! - Disk cache: a sharded LRU byte store with TTL ([`DiskCache`]) and a
//!   Parquet DataFrame adapter on top ([`FrameCache`])
//! - Packaged assets: `{Provider}.parquet` symbol tables with CSV/Excel
//!   ingestion ([`AssetStore`])
//!
//! Everything is synchronous and blocking. The cache is an optimization
//! layer, never a source of truth: cache failures are reported but do not
//! fail the caller's operation.

pub mod assets;
pub mod cache;
pub mod ingest;
pub mod paths;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use assets::AssetStore;
pub use cache::{CacheConfig, CacheStats, DiskCache, FrameCache, SaveOutcome};
pub use paths::default_cache_dir;
pub use provider::{DataError, MarketDataProvider, OhlcvBar, Quote, SymbolInfo};
pub use yahoo::YahooFinanceProvider;
