//! On-disk encoding of snapshots.
//!
//! Small datasets are stored as CSV so they stay readable in any editor.
//! Anything whose in-memory footprint reaches the threshold goes to Parquet.

use super::Tabular;
use crate::error::{Result, ShelfError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Footprint from which snapshots are written as Parquet (10 MiB).
pub const DEFAULT_THRESHOLD_BYTES: usize = 10 * 1024 * 1024;

/// Environment variable overriding [`DEFAULT_THRESHOLD_BYTES`].
pub const THRESHOLD_ENV_VAR: &str = "DATASHELF_PARQUET_THRESHOLD_BYTES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    Csv,
    Parquet,
}

impl StorageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }

    /// Format of a stored artifact, judged by its extension.
    ///
    /// # Errors
    ///
    /// `UnsupportedInputType` for anything but `.csv` and `.parquet`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            _ => {
                let err = ShelfError::UnsupportedInputType(format!(
                    "{} is neither .csv nor .parquet",
                    path.display()
                ));
                tracing::error!("{err}");
                Err(err)
            }
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A snapshot file written by [`StorageEncoder::choose_and_write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub format: StorageFormat,
    pub footprint_bytes: usize,
}

/// Picks CSV or Parquet by size and writes the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageEncoder {
    threshold: usize,
}

impl Default for StorageEncoder {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD_BYTES,
        }
    }
}

impl StorageEncoder {
    pub fn with_threshold(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Threshold from [`THRESHOLD_ENV_VAR`], falling back to the default
    /// when unset or unparseable.
    pub fn from_env() -> Self {
        match std::env::var(THRESHOLD_ENV_VAR) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(threshold) => {
                    tracing::debug!("Parquet threshold overridden to {threshold} bytes");
                    Self::with_threshold(threshold)
                }
                Err(e) => {
                    tracing::warn!("Ignoring {THRESHOLD_ENV_VAR}={raw:?}: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// CSV below the threshold, Parquet at or above it.
    pub fn choose(&self, data: &dyn Tabular) -> StorageFormat {
        if data.footprint_bytes() >= self.threshold {
            StorageFormat::Parquet
        } else {
            StorageFormat::Csv
        }
    }

    /// Write `data` to `stem` with the chosen format's extension appended.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Tabular::encode`].
    pub fn choose_and_write(&self, data: &dyn Tabular, stem: &Path) -> Result<StoredArtifact> {
        let footprint_bytes = data.footprint_bytes();
        let format = self.choose(data);

        let mut file_name = stem.file_name().unwrap_or_default().to_os_string();
        file_name.push(".");
        file_name.push(format.extension());
        let path = stem.with_file_name(file_name);

        data.encode(&path, format)?;
        tracing::info!(
            "Wrote {} ({footprint_bytes} bytes in memory) as {format}",
            path.display()
        );

        Ok(StoredArtifact {
            path,
            format,
            footprint_bytes,
        })
    }
}
