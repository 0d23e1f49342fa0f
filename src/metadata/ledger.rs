//! Per-collection ledger document.

use super::{read_document, write_document};
use crate::error::{Result, ShelfError};
use crate::tabular::ColumnSpec;
use crate::utils::timestamp_now;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Summary block at the top of a ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSummary {
    pub collection_name: String,
    #[serde(rename = "date_created")]
    pub created_at: String,
    #[serde(rename = "number_of_files")]
    pub file_count: u64,
    /// Path of the last stored artifact, empty before the first save
    pub most_recent_commit: String,
    /// Highest version handed out so far, 0 before the first save
    pub max_version: u64,
}

/// One stored artifact. The ledger's own bootstrap entry has an empty hash and
/// no version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub hash: String,
    #[serde(rename = "date_created")]
    pub created_at: String,
    #[serde(rename = "date_last_modified")]
    pub last_modified_at: String,
    pub tag: String,
    pub version: Option<u64>,
    pub message: String,
    pub file_path: PathBuf,
    pub deleted: bool,
    /// Column types at save time, empty for the bootstrap entry and for
    /// ledgers written before types were recorded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<ColumnSpec>,
}

impl FileEntry {
    /// Entry describing the ledger document itself.
    fn bootstrap(name: String, file_path: PathBuf) -> Self {
        Self {
            name,
            hash: String::new(),
            created_at: timestamp_now(),
            last_modified_at: String::new(),
            tag: String::new(),
            version: None,
            message: String::new(),
            file_path,
            deleted: false,
            schema: Vec::new(),
        }
    }

    /// Entry for a freshly saved dataset snapshot.
    pub fn snapshot(
        name: impl Into<String>,
        hash: impl Into<String>,
        tag: impl Into<String>,
        message: impl Into<String>,
        version: u64,
        file_path: PathBuf,
    ) -> Self {
        let now = timestamp_now();
        Self {
            name: name.into(),
            hash: hash.into(),
            created_at: now.clone(),
            last_modified_at: now,
            tag: tag.into(),
            version: Some(version),
            message: message.into(),
            file_path,
            deleted: false,
            schema: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Vec<ColumnSpec>) -> Self {
        self.schema = schema;
        self
    }

    /// Whether this entry describes a dataset (as opposed to the bootstrap entry).
    pub fn is_snapshot(&self) -> bool {
        self.version.is_some()
    }
}

/// The full ledger document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerDocument {
    pub metadata: LedgerSummary,
    pub files: Vec<FileEntry>,
}

impl LedgerDocument {
    /// Entries not flagged as deleted.
    pub fn active_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(|f| !f.deleted)
    }

    /// Highest version recorded on any entry, deleted or not.
    pub fn max_recorded_version(&self) -> u64 {
        self.files.iter().filter_map(|f| f.version).max().unwrap_or(0)
    }
}

/// Handle on one collection's ledger file.
///
/// Every method re-reads the document from disk; nothing is cached between
/// calls.
#[derive(Debug, Clone)]
pub struct CollectionLedger {
    collection: String,
    path: PathBuf,
}

impl CollectionLedger {
    /// Ledger file name for a (normalized) collection name.
    pub fn file_name(collection: &str) -> String {
        format!("{collection}_metadata.yaml")
    }

    /// Create the collection directory and write a fresh ledger holding only
    /// the bootstrap entry.
    ///
    /// # Errors
    ///
    /// I/O or YAML errors from creating the directory or writing the ledger.
    pub fn initialize(collection_dir: &Path, collection: &str) -> Result<Self> {
        fs::create_dir_all(collection_dir).map_err(|e| {
            tracing::error!(
                "Failed to create collection directory {}: {e}",
                collection_dir.display()
            );
            ShelfError::from(e)
        })?;

        let file_name = Self::file_name(collection);
        let path = collection_dir.join(&file_name);
        let doc = LedgerDocument {
            metadata: LedgerSummary {
                collection_name: collection.to_owned(),
                created_at: timestamp_now(),
                file_count: 1,
                most_recent_commit: String::new(),
                max_version: 0,
            },
            files: vec![FileEntry::bootstrap(file_name, path.clone())],
        };
        write_document(&path, &doc)?;

        tracing::debug!("Initialized ledger {}", path.display());
        Ok(Self {
            collection: collection.to_owned(),
            path,
        })
    }

    /// Handle on an existing ledger.
    ///
    /// # Errors
    ///
    /// `CorruptState` if the ledger file is not there.
    pub fn open(collection_dir: &Path, collection: &str) -> Result<Self> {
        let path = collection_dir.join(Self::file_name(collection));
        if !path.is_file() {
            let msg = format!(
                "Collection directory '{}' exists but its ledger '{}' does not. \
                 Consider deleting and recreating the collection.",
                collection_dir.display(),
                path.display()
            );
            tracing::error!("{msg}");
            return Err(ShelfError::CorruptState(msg));
        }
        Ok(Self {
            collection: collection.to_owned(),
            path,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// `CorruptState` when the ledger is missing or does not parse.
    pub fn read(&self) -> Result<LedgerDocument> {
        read_document(&self.path, "Collection ledger")
    }

    /// Version number for the next snapshot.
    ///
    /// An empty `files` list means the ledger lost even its bootstrap entry;
    /// a recorded version above `max_version` means the summary fell behind.
    ///
    /// # Errors
    ///
    /// Both cases above are reported as `CorruptState`, as is an unreadable ledger.
    pub fn next_version(&self) -> Result<u64> {
        let doc = self.read()?;

        if doc.files.is_empty() {
            let msg = format!(
                "No file entries found in the ledger for collection '{}'. \
                 The collection may be corrupted; consider deleting and re-creating it.",
                self.collection
            );
            tracing::error!("{msg}");
            return Err(ShelfError::CorruptState(msg));
        }

        let recorded = doc.max_recorded_version();
        if recorded > doc.metadata.max_version {
            let msg = format!(
                "Ledger for collection '{}' records version {recorded} but max_version is {}",
                self.collection, doc.metadata.max_version
            );
            tracing::error!("{msg}");
            return Err(ShelfError::CorruptState(msg));
        }

        Ok(doc.metadata.max_version + 1)
    }

    /// Append an entry. The summary block is left alone; follow up with
    /// [`Self::update_summary`].
    ///
    /// # Errors
    ///
    /// Fails if the ledger cannot be read or rewritten.
    pub fn record_file(&self, entry: FileEntry) -> Result<()> {
        let mut doc = self.read()?;
        doc.files.push(entry);
        write_document(&self.path, &doc)
    }

    /// Bump the file count and record the newest artifact and version.
    ///
    /// # Errors
    ///
    /// Fails if the ledger cannot be read or rewritten.
    pub fn update_summary(&self, most_recent_commit: &Path, new_version: u64) -> Result<()> {
        let mut doc = self.read()?;
        doc.metadata.file_count += 1;
        doc.metadata.most_recent_commit = most_recent_commit.display().to_string();
        doc.metadata.max_version = new_version;
        write_document(&self.path, &doc)
    }

    /// All entries, including the bootstrap entry and deleted entries.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    pub fn list_files(&self) -> Result<Vec<FileEntry>> {
        Ok(self.read()?.files)
    }

    /// First non-deleted entry whose hash equals `hash`.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    pub fn find_by_hash(&self, hash: &str) -> Result<Option<FileEntry>> {
        let doc = self.read()?;
        Ok(doc.active_files().find(|f| f.hash == hash).cloned())
    }
}
