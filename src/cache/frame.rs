//! DataFrame round-trip through the disk cache.
//!
//! Frames are encoded to Parquet in memory and stored as plain bytes, so the
//! byte store stays oblivious to polars. The cache is an optimization, not a
//! source of truth: `save` and `load` never fail the caller.

use std::io::Cursor;

use polars::prelude::*;
use tracing::{debug, warn};

use super::disk::DiskCache;

/// Outcome of a best-effort cache save.
///
/// A frame that cannot be cached is reported here while the caller's own
/// operation proceeds untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The frame was encoded and stored.
    Saved,
    /// The frame had no rows or no columns; nothing was stored.
    SkippedEmpty,
    /// Encoding or storage failed; the formatted cause is carried for
    /// observability.
    Failed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Caches polars DataFrames as Parquet bytes under string keys.
#[derive(Debug, Clone)]
pub struct FrameCache {
    disk: DiskCache,
}

impl FrameCache {
    pub fn new(disk: DiskCache) -> Self {
        Self { disk }
    }

    /// The underlying byte store.
    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    /// Encode `frame` to Parquet and store it under `key`.
    pub fn save(&self, key: &str, frame: &DataFrame) -> SaveOutcome {
        if frame.height() == 0 || frame.width() == 0 {
            warn!(key, "skipping cache save of empty frame");
            return SaveOutcome::SkippedEmpty;
        }

        let bytes = match encode_parquet(frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "failed to encode frame for cache");
                return SaveOutcome::Failed(e.to_string());
            }
        };

        match self.disk.set(key, &bytes) {
            Ok(()) => {
                debug!(key, bytes = bytes.len(), "saved frame to cache");
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!(key, error = %e, "failed to store frame in cache");
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Load the frame stored under `key`. `None` on a miss or when the
    /// stored bytes do not decode; the distinguishing reason is logged.
    pub fn load(&self, key: &str) -> Option<DataFrame> {
        let bytes = match self.disk.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                return None;
            }
        };

        match decode_parquet(&bytes) {
            Ok(frame) => {
                debug!(key, rows = frame.height(), "loaded frame from cache");
                Some(frame)
            }
            Err(e) => {
                warn!(key, error = %e, "failed to decode cached frame");
                None
            }
        }
    }
}

fn encode_parquet(frame: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf).finish(&mut frame.clone())?;
    Ok(buf)
}

fn decode_parquet(bytes: &[u8]) -> PolarsResult<DataFrame> {
    ParquetReader::new(Cursor::new(bytes)).finish()
}
