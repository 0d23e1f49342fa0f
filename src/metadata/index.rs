//! Root index document (`datashelf_metadata.yaml`).

use super::ledger::CollectionLedger;
use super::{read_document, write_document};
use crate::error::{Result, io_failure};
use crate::utils::timestamp_now;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the root index inside the marker directory.
pub const INDEX_FILE_NAME: &str = "datashelf_metadata.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSummary {
    #[serde(rename = "date_created")]
    pub created_at: String,
    #[serde(rename = "number_of_collections")]
    pub collection_count: u64,
    pub collections: Vec<String>,
}

/// Per-collection record in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionDetail {
    pub collection_name: String,
    #[serde(rename = "date_created")]
    pub created_at: String,
    #[serde(rename = "date_last_modified")]
    pub last_modified_at: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDocument {
    pub metadata: IndexSummary,
    pub collections: Vec<CollectionDetail>,
}

impl IndexDocument {
    pub fn detail(&self, collection: &str) -> Option<&CollectionDetail> {
        self.collections
            .iter()
            .find(|c| c.collection_name == collection)
    }
}

/// Handle on the root index file.
#[derive(Debug, Clone)]
pub struct RootIndex {
    path: PathBuf,
}

impl RootIndex {
    pub fn new(shelf_dir: &Path) -> Self {
        Self {
            path: shelf_dir.join(INDEX_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh index.
    ///
    /// Every directory already present under `shelf_dir` is counted as a
    /// collection, so a partially built tree can be re-attached. The detail
    /// list starts empty.
    ///
    /// # Errors
    ///
    /// I/O errors listing `shelf_dir` and errors writing the index.
    pub fn initialize(shelf_dir: &Path) -> Result<Self> {
        let mut existing = Vec::new();
        for entry in fs::read_dir(shelf_dir).map_err(io_failure("list", shelf_dir))? {
            let entry = entry.map_err(io_failure("list", shelf_dir))?;
            let file_type = entry
                .file_type()
                .map_err(io_failure("inspect", &entry.path()))?;
            if file_type.is_dir() {
                existing.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        existing.sort();

        let index = Self::new(shelf_dir);
        let doc = IndexDocument {
            metadata: IndexSummary {
                created_at: timestamp_now(),
                collection_count: existing.len() as u64,
                collections: existing,
            },
            collections: Vec::new(),
        };
        write_document(&index.path, &doc)?;

        tracing::debug!(
            "Initialized root index with {} pre-existing collection(s)",
            doc.metadata.collection_count
        );
        Ok(index)
    }

    /// # Errors
    ///
    /// `CorruptState` when the index is missing or malformed.
    pub fn read(&self) -> Result<IndexDocument> {
        read_document(&self.path, "Root index")
    }

    /// Append a collection to the summary and detail lists.
    ///
    /// The detail record lists the bare file names found in `collection_dir`,
    /// the same form [`Self::refresh_collection_files`] writes later.
    ///
    /// # Errors
    ///
    /// Fails if the index cannot be read or rewritten, or `collection_dir`
    /// cannot be listed. The index is left untouched in the latter case.
    pub fn register_collection(&self, collection: &str, collection_dir: &Path) -> Result<()> {
        let mut doc = self.read()?;
        let now = timestamp_now();

        let mut files = Vec::new();
        for entry in fs::read_dir(collection_dir).map_err(io_failure("list", collection_dir))? {
            let entry = entry.map_err(io_failure("list", collection_dir))?;
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
        files.sort();

        doc.metadata.collection_count += 1;
        doc.metadata.collections.push(collection.to_owned());
        doc.collections.push(CollectionDetail {
            collection_name: collection.to_owned(),
            created_at: now.clone(),
            last_modified_at: now,
            files,
        });

        write_document(&self.path, &doc)
    }

    /// Copy the ledger's non-deleted file names into the collection's detail
    /// record. Does nothing when the collection has no detail record.
    ///
    /// # Errors
    ///
    /// Fails if either document cannot be read, or the index cannot be rewritten.
    pub fn refresh_collection_files(&self, ledger: &CollectionLedger) -> Result<()> {
        let mut doc = self.read()?;
        let Some(detail) = doc
            .collections
            .iter_mut()
            .find(|c| c.collection_name == ledger.collection())
        else {
            tracing::debug!(
                "Collection '{}' not in root index, skipping refresh",
                ledger.collection()
            );
            return Ok(());
        };

        detail.files = ledger
            .read()?
            .active_files()
            .map(|f| f.name.clone())
            .collect();
        detail.last_modified_at = timestamp_now();

        write_document(&self.path, &doc)
    }
}
