//! Metadata documents kept under the `.datashelf` directory.
//!
//! There are two linked YAML documents:
//!
//! - [`RootIndex`] (`datashelf_metadata.yaml`): which collections exist, when
//!   they were last modified and which files they hold.
//! - [`CollectionLedger`] (`<collection>/<collection>_metadata.yaml`): every
//!   snapshot saved into one collection, with hash, tag, message and version.
//!
//! Both are persisted by whole-document rewrite: read the entire file, mutate
//! in memory, write the entire file back. There is no locking, so two
//! concurrent writers can lose one side's update.

pub mod index;
pub mod ledger;

pub use index::{CollectionDetail, IndexDocument, IndexSummary, RootIndex};
pub use ledger::{CollectionLedger, FileEntry, LedgerDocument, LedgerSummary};

use crate::error::{Result, ShelfError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and parse a YAML document.
///
/// A missing or malformed document is reported as [`ShelfError::CorruptState`];
/// other I/O failures (permissions and the like) pass through as-is.
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let msg = format!("{what} document is missing: {}", path.display());
            tracing::error!("{msg}");
            return Err(ShelfError::CorruptState(msg));
        }
        Err(e) => {
            tracing::error!("Failed to read {what} document {}: {e}", path.display());
            return Err(e.into());
        }
    };

    serde_yaml::from_str(&text).map_err(|e| {
        let msg = format!("{what} document is malformed ({}): {e}", path.display());
        tracing::error!("{msg}");
        ShelfError::CorruptState(msg)
    })
}

/// Serialize a document and overwrite `path` with it.
pub(crate) fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(doc)?;
    fs::write(path, yaml).map_err(|e| {
        tracing::error!("Failed to write {}: {e}", path.display());
        ShelfError::from(e)
    })
}
