//! Looking snapshots up by content hash.

use super::Shelf;
use crate::error::{Result, ShelfError, io_failure};
use crate::metadata::FileEntry;
use crate::tabular::{StorageFormat, Tabular};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};

impl Shelf {
    /// First non-deleted entry in `collection` whose hash is `hash`.
    ///
    /// # Errors
    ///
    /// `SnapshotNotFound` when no live entry matches, plus anything
    /// [`Shelf::ledger`] reports.
    pub fn find_snapshot(&self, collection: &str, hash: &str) -> Result<FileEntry> {
        let ledger = self.ledger(collection)?;
        match ledger.find_by_hash(hash)? {
            Some(entry) => Ok(entry),
            None => {
                let err = ShelfError::SnapshotNotFound {
                    collection: ledger.collection().to_owned(),
                    hash: hash.to_owned(),
                };
                tracing::error!("{err}");
                Err(err)
            }
        }
    }

    /// Copy the snapshot's artifact into `dest_dir`, keeping its file name.
    /// Returns the path of the copy.
    ///
    /// When `dest_dir` resolves to the directory already holding the artifact,
    /// however it is spelled, nothing is copied and the artifact's path is
    /// returned.
    ///
    /// # Errors
    ///
    /// Lookup errors from [`Shelf::find_snapshot`], `CorruptState` for an entry
    /// without a file name, and I/O errors creating `dest_dir` or copying.
    pub fn checkout(&self, collection: &str, hash: &str, dest_dir: &Path) -> Result<PathBuf> {
        let entry = self.find_snapshot(collection, hash)?;
        let Some(file_name) = entry.file_path.file_name() else {
            let msg = format!(
                "Entry '{}' has no usable file path: '{}'",
                entry.name,
                entry.file_path.display()
            );
            tracing::error!("{msg}");
            return Err(ShelfError::CorruptState(msg));
        };

        fs::create_dir_all(dest_dir).map_err(io_failure("create directory", dest_dir))?;
        let target = fs::canonicalize(dest_dir)
            .map_err(io_failure("resolve", dest_dir))?
            .join(file_name);
        let source =
            fs::canonicalize(&entry.file_path).map_err(io_failure("resolve", &entry.file_path))?;
        if target == source {
            tracing::warn!("{} is already in place", target.display());
            return Ok(target);
        }

        fs::copy(&source, &target).map_err(io_failure("copy to", &target))?;
        tracing::info!(
            "Checked out '{}' (version {}) to {}",
            entry.name,
            entry.version.unwrap_or_default(),
            target.display()
        );
        Ok(target)
    }

    /// Decode the snapshot's artifact into memory, restoring the column types
    /// recorded at save time.
    ///
    /// # Errors
    ///
    /// Lookup errors from [`Shelf::find_snapshot`], `UnsupportedInputType` for
    /// an artifact that is neither CSV nor Parquet, and read errors.
    pub fn load(&self, collection: &str, hash: &str) -> Result<DataFrame> {
        let entry = self.find_snapshot(collection, hash)?;
        let format = StorageFormat::from_path(&entry.file_path)?;
        let df = DataFrame::decode(&entry.file_path, format, &entry.schema)?;
        tracing::debug!(
            "Loaded '{}' from {} ({} rows)",
            entry.name,
            entry.file_path.display(),
            df.height()
        );
        Ok(df)
    }
}
