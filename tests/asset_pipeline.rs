//! End-to-end: ingest a screener CSV, read the symbol universe through the
//! provider, and confirm the cache serves the second read.

use std::fs;
use std::path::Path;

use marketlab::{
    AssetStore, CacheConfig, DiskCache, FrameCache, MarketDataProvider, YahooFinanceProvider,
};

fn build_provider(root: &Path) -> (YahooFinanceProvider, FrameCache, AssetStore) {
    let assets = AssetStore::new(root.join("assets"));
    let cache = FrameCache::new(DiskCache::open(CacheConfig::new(root.join("cache"))).unwrap());
    (
        YahooFinanceProvider::new(assets.clone(), cache.clone()),
        cache,
        assets,
    )
}

#[test]
fn ingest_load_and_cache_flow() {
    let dir = tempfile::tempdir().unwrap();
    let (provider, cache, assets) = build_provider(dir.path());

    let source = dir.path().join("screener.csv");
    fs::write(
        &source,
        "Ticker,Name,Exchange\nAAPL,Apple,NMS\n,Ghost,NMS\nMSFT,Microsoft,NMS\n",
    )
    .unwrap();

    // Ingest converts the CSV into the packaged Parquet asset.
    let asset_path = provider.update_symbol_universe(&source).unwrap();
    assert_eq!(asset_path, assets.asset_path("YahooFinance"));

    // First read comes from the asset file and populates the cache.
    let symbols = provider.symbol_universe().unwrap();
    let tickers: Vec<&str> = symbols.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(tickers, ["AAPL", "MSFT"]);
    assert_eq!(symbols[0].name.as_deref(), Some("Apple"));
    assert!(cache.load("YahooFinance.parquet").is_some());

    // Second read is served by the cache alone: deleting the asset file
    // does not break it.
    fs::remove_file(&asset_path).unwrap();
    let cached = provider.symbol_universe().unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[1].symbol, "MSFT");
}
