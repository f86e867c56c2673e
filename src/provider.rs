//! Provider trait, shared market-data DTOs, and structured error types.
//!
//! The MarketDataProvider trait abstracts over symbol-universe sources
//! (Yahoo Finance asset tables today, other vendors later) so callers can
//! swap implementations and mock for tests. The trait is deliberately
//! narrow: it declares exactly the operations that have working
//! implementations. Quote retrieval, symbol search, and historical fetches
//! enter the trait when a real implementation lands, not before.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata for a tradable symbol.
///
/// `symbol` is the unique key within a provider's universe; everything else
/// is optional and filled from whichever columns the provider's asset table
/// carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
}

impl SymbolInfo {
    /// A SymbolInfo with only the symbol set.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            exchange: None,
            category: None,
            country: None,
            currency: None,
        }
    }
}

/// Latest price/quote for a symbol. Never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume: Option<f64>,
    /// Provider-specific raw payload.
    pub raw: Option<serde_json::Value>,
}

/// One historical bar (open-high-low-close-volume).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub raw: Option<serde_json::Value>,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("asset file not found: {path}")]
    AssetNotFound { path: PathBuf },

    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("unsupported asset file extension: '{extension}'")]
    UnsupportedExtension { extension: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("ingest error: {0}")]
    IngestError(String),
}

/// Trait for market-data providers.
///
/// Implementations are synchronous and blocking; the cache layer sits below
/// this trait, inside each implementation's collaborators.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable provider name (e.g. "YahooFinance").
    fn name(&self) -> &str;

    /// The full list of symbols this provider supports, in asset row order.
    fn symbol_universe(&self) -> Result<Vec<SymbolInfo>, DataError>;

    /// Replace the provider's packaged symbol table with a freshly ingested
    /// CSV or Excel file. Returns the path of the written asset.
    fn update_symbol_universe(&self, source: &Path) -> Result<PathBuf, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_info_serde_roundtrip() {
        let info = SymbolInfo {
            name: Some("Apple".into()),
            exchange: Some("NMS".into()),
            ..SymbolInfo::new("AAPL")
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(serde_json::from_str::<SymbolInfo>(&json).unwrap(), info);
    }

    #[test]
    fn quote_carries_raw_payload() {
        let quote = Quote {
            symbol: "AAPL".into(),
            timestamp: Utc::now(),
            price: 213.55,
            bid: Some(213.50),
            ask: Some(213.60),
            volume: None,
            raw: Some(serde_json::json!({"marketState": "REGULAR"})),
        };
        let json = serde_json::to_string(&quote).unwrap();
        let back: Quote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, quote);
        assert_eq!(back.raw.unwrap()["marketState"], "REGULAR");
    }

    #[test]
    fn error_messages_name_the_culprit() {
        let err = DataError::MissingColumn {
            column: "Ticker".into(),
        };
        assert_eq!(err.to_string(), "missing required column 'Ticker'");

        let err = DataError::UnsupportedExtension {
            extension: "txt".into(),
        };
        assert!(err.to_string().contains("'txt'"));

        let err = DataError::AssetNotFound {
            path: PathBuf::from("/assets/YahooFinance.parquet"),
        };
        assert!(err.to_string().contains("YahooFinance.parquet"));
    }
}
