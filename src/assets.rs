//! Packaged asset store: one Parquet symbol table per provider.
//!
//! Assets are read-mostly reference data shipped with the application
//! (`{dir}/{name}.parquet`). The only write path is ingestion, which
//! converts an externally supplied CSV/Excel symbol list into the packaged
//! format.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::ingest;
use crate::provider::DataError;

#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the packaged table for `name`: `{dir}/{name}.parquet`.
    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.parquet"))
    }

    /// Read the packaged table for `name`.
    pub fn read_table(&self, name: &str) -> Result<DataFrame, DataError> {
        let path = self.asset_path(name);
        if !path.exists() {
            return Err(DataError::AssetNotFound { path });
        }
        let file = fs::File::open(&path)
            .map_err(|e| DataError::ParquetError(format!("open {}: {e}", path.display())))?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| DataError::ParquetError(format!("read {}: {e}", path.display())))
    }

    /// Convert a CSV or Excel file into a packaged Parquet asset.
    ///
    /// The output name defaults to the input file stem; an explicit name may
    /// carry the `.parquet` suffix or not. Returns the path of the written
    /// asset. The assets directory is created if absent.
    pub fn ingest_file(
        &self,
        input: &Path,
        output_name: Option<&str>,
    ) -> Result<PathBuf, DataError> {
        let frame = ingest::parse_source_file(input)?;

        let name = match output_name {
            Some(name) => name.trim_end_matches(".parquet").to_string(),
            None => input
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    DataError::IngestError(format!(
                        "cannot derive asset name from {}",
                        input.display()
                    ))
                })?
                .to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(|e| {
            DataError::IngestError(format!(
                "failed to create assets dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let out_path = self.asset_path(&name);
        write_parquet(&frame, &out_path)?;
        info!(
            input = %input.display(),
            output = %out_path.display(),
            rows = frame.height(),
            "ingested asset file"
        );
        Ok(out_path)
    }
}

/// Atomic Parquet write: temp file, then rename into place.
pub(crate) fn write_parquet(frame: &DataFrame, path: &Path) -> Result<(), DataError> {
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::ParquetError(format!("create {}: {e}", tmp_path.display())))?;
    ParquetWriter::new(file).finish(&mut frame.clone()).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::ParquetError(format!("write {}: {e}", path.display()))
    })?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::ParquetError(format!("atomic rename to {}: {e}", path.display()))
    })?;
    Ok(())
}
