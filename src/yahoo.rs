//! Yahoo Finance provider.
//!
//! Symbol metadata comes from the packaged asset table (a screener export
//! shipped with the application); there is no live API access in this layer.

use std::path::{Path, PathBuf};

use crate::assets::AssetStore;
use crate::cache::FrameCache;
use crate::provider::{DataError, MarketDataProvider, SymbolInfo};
use crate::universe;

pub const PROVIDER_NAME: &str = "YahooFinance";

pub struct YahooFinanceProvider {
    assets: AssetStore,
    cache: FrameCache,
}

impl YahooFinanceProvider {
    pub fn new(assets: AssetStore, cache: FrameCache) -> Self {
        Self { assets, cache }
    }
}

impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn symbol_universe(&self) -> Result<Vec<SymbolInfo>, DataError> {
        universe::load_symbol_universe(self.name(), &self.assets, &self.cache)
    }

    /// Re-ingest a screener export as this provider's packaged table. Any
    /// cached copy of the old table ages out through the cache's own TTL and
    /// eviction policy.
    fn update_symbol_universe(&self, source: &Path) -> Result<PathBuf, DataError> {
        self.assets.ingest_file(source, Some(PROVIDER_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, DiskCache};
    use std::fs;

    fn provider(root: &Path) -> YahooFinanceProvider {
        let assets = AssetStore::new(root.join("assets"));
        let cache = FrameCache::new(
            DiskCache::open(CacheConfig::new(root.join("cache"))).unwrap(),
        );
        YahooFinanceProvider::new(assets, cache)
    }

    #[test]
    fn name_is_yahoo_finance() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(provider(dir.path()).name(), "YahooFinance");
    }

    #[test]
    fn update_then_read_universe() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        let source = dir.path().join("screener.csv");
        fs::write(&source, "Ticker,Name\nAAPL,Apple\nMSFT,Microsoft\n").unwrap();

        let written = provider.update_symbol_universe(&source).unwrap();
        assert!(written.ends_with("YahooFinance.parquet"));

        let symbols = provider.symbol_universe().unwrap();
        let tickers: Vec<&str> = symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(tickers, ["AAPL", "MSFT"]);
    }

    #[test]
    fn universe_without_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        assert!(matches!(
            provider.symbol_universe(),
            Err(DataError::AssetNotFound { .. })
        ));
    }
}
