//! Provider symbol universes: cache-then-asset fallback.
//!
//! The packaged asset table is the source of truth; the frame cache is an
//! optimization in front of it. Cache failures never fail a load.

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::assets::AssetStore;
use crate::cache::{FrameCache, SaveOutcome};
use crate::provider::{DataError, SymbolInfo};

/// Required symbol-identifier column.
pub const TICKER_COLUMN: &str = "Ticker";

// Optional columns mapped onto SymbolInfo fields when present.
const NAME_COLUMN: &str = "Name";
const EXCHANGE_COLUMN: &str = "Exchange";
const CATEGORY_COLUMN: &str = "Category Name";
const COUNTRY_COLUMN: &str = "Country";
const CURRENCY_COLUMN: &str = "Currency";

/// Load the symbol universe for `provider_name`.
///
/// Tries the frame cache under `"{provider_name}.parquet"` first, then falls
/// back to the packaged asset table; on a fallback the decoded table is
/// saved back into the cache best-effort.
pub fn load_symbol_universe(
    provider_name: &str,
    assets: &AssetStore,
    cache: &FrameCache,
) -> Result<Vec<SymbolInfo>, DataError> {
    let cache_key = format!("{provider_name}.parquet");

    let frame = match cache.load(&cache_key) {
        Some(frame) => frame,
        None => {
            let frame = assets.read_table(provider_name)?;
            // The asset read succeeded; a failed save only costs the next
            // call a re-read.
            if let SaveOutcome::Failed(reason) = cache.save(&cache_key, &frame) {
                warn!(key = cache_key.as_str(), reason = reason.as_str(), "symbol table not cached");
            }
            frame
        }
    };

    let symbols = symbols_from_frame(&frame)?;
    info!(
        provider = provider_name,
        count = symbols.len(),
        "loaded symbol universe"
    );
    Ok(symbols)
}

/// Map table rows to SymbolInfo in source order. Rows without a ticker are
/// skipped; optional fields come from matching columns when present.
fn symbols_from_frame(frame: &DataFrame) -> Result<Vec<SymbolInfo>, DataError> {
    let tickers = frame.column(TICKER_COLUMN).map_err(|_| DataError::MissingColumn {
        column: TICKER_COLUMN.to_string(),
    })?;

    let mut symbols = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let Some(ticker) = cell_string(tickers, row) else {
            debug!(row, "skipping row without ticker");
            continue;
        };
        symbols.push(SymbolInfo {
            symbol: ticker,
            name: optional_cell(frame, NAME_COLUMN, row),
            exchange: optional_cell(frame, EXCHANGE_COLUMN, row),
            category: optional_cell(frame, CATEGORY_COLUMN, row),
            country: optional_cell(frame, COUNTRY_COLUMN, row),
            currency: optional_cell(frame, CURRENCY_COLUMN, row),
        });
    }
    Ok(symbols)
}

fn optional_cell(frame: &DataFrame, column: &str, row: usize) -> Option<String> {
    frame.column(column).ok().and_then(|c| cell_string(c, row))
}

/// Stringify a cell, mapping nulls to None.
fn cell_string(column: &Column, row: usize) -> Option<String> {
    match column.get(row) {
        Ok(AnyValue::Null) | Err(_) => None,
        Ok(AnyValue::String(s)) => Some(s.to_string()),
        Ok(AnyValue::StringOwned(s)) => Some(s.to_string()),
        Ok(other) => Some(other.to_string()),
    }
}
