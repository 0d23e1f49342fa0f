//! The versioning engine.
//!
//! A [`Shelf`] ties a resolved [`ProjectRoot`] to a [`StorageEncoder`] and
//! exposes every operation that changes or reads the shelf: creating
//! collections, saving snapshots, and retrieving them by content hash.
//!
//! Every operation re-reads the documents it touches and rewrites them whole.
//! There is no locking and no rollback: if a save fails after the artifact is
//! written, the artifact, ledger and index can disagree until fixed by hand.
//!
//! # Example
//!
//! ```no_run
//! use datashelf::shelf::{SaveOutcome, SaveRequest, Shelf};
//! use polars::prelude::*;
//! use std::path::Path;
//!
//! # fn example() -> datashelf::error::Result<()> {
//! let shelf = Shelf::open(Path::new("."))?;
//! shelf.create_collection("Sales 2024")?;
//!
//! let df = df!("region" => &["north", "south"], "units" => &[10, 12])?;
//! let request = SaveRequest::new("Sales 2024", "q1", "raw", "first extract");
//! if let SaveOutcome::Saved(snapshot) = shelf.save(&df, &request)? {
//!     println!("v{} {}", snapshot.version, snapshot.hash);
//! }
//! # Ok(())
//! # }
//! ```

mod retrieve;
mod save;

pub use save::{SaveOutcome, SaveRequest, SavedSnapshot};

use crate::config::TagPolicy;
use crate::error::{Result, ShelfError};
use crate::metadata::{CollectionLedger, RootIndex};
use crate::project::ProjectRoot;
use crate::tabular::StorageEncoder;
use crate::utils::checked_name;
use std::path::Path;

/// Result of [`Shelf::create_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone)]
pub struct Shelf {
    root: ProjectRoot,
    encoder: StorageEncoder,
}

impl Shelf {
    /// Discover the project enclosing `start`. The Parquet threshold comes
    /// from the environment, see [`StorageEncoder::from_env`].
    ///
    /// # Errors
    ///
    /// `ProjectNotInitialized` when no initialized `.datashelf` encloses `start`.
    pub fn open(start: &Path) -> Result<Self> {
        Ok(Self {
            root: ProjectRoot::discover(start)?,
            encoder: StorageEncoder::from_env(),
        })
    }

    pub fn new(root: ProjectRoot) -> Self {
        Self {
            root,
            encoder: StorageEncoder::default(),
        }
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: StorageEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn root(&self) -> &ProjectRoot {
        &self.root
    }

    pub fn encoder(&self) -> StorageEncoder {
        self.encoder
    }

    /// Create a collection directory with an empty ledger and register it in
    /// the root index. The name is normalized first.
    ///
    /// An existing collection is left alone.
    ///
    /// # Errors
    ///
    /// `InvalidName` when the name is not a plain directory name, `CorruptState`
    /// when the directory exists without a ledger, and I/O or YAML errors from
    /// writing the ledger and index.
    pub fn create_collection(&self, collection: &str) -> Result<CollectionOutcome> {
        let name = checked_name(collection)?;
        let dir = self.root.collection_dir(&name);

        if dir.is_dir() {
            CollectionLedger::open(&dir, &name)?;
            tracing::warn!("Collection '{name}' already exists, nothing to do");
            return Ok(CollectionOutcome::AlreadyExists);
        }

        CollectionLedger::initialize(&dir, &name)?;
        self.index().register_collection(&name, &dir)?;

        tracing::info!("Created collection '{name}' at {}", dir.display());
        Ok(CollectionOutcome::Created)
    }

    /// # Errors
    ///
    /// `CorruptState` if the policy document is missing or malformed.
    pub fn tag_policy(&self) -> Result<TagPolicy> {
        TagPolicy::load(&self.root.config_path())
    }

    /// Persist a new enforcement flag and return the updated policy.
    ///
    /// # Errors
    ///
    /// Fails if the policy document cannot be read or rewritten.
    pub fn set_tag_enforcement(&self, enforced: bool) -> Result<TagPolicy> {
        TagPolicy::set_enforcement(&self.root.config_path(), enforced)
    }

    pub fn index(&self) -> RootIndex {
        self.root.index()
    }

    /// Ledger of an existing collection.
    ///
    /// # Errors
    ///
    /// `InvalidName` for names that are not plain directory names,
    /// `CollectionNotFound` when the collection directory is missing and
    /// `CorruptState` when it has no ledger.
    pub fn ledger(&self, collection: &str) -> Result<CollectionLedger> {
        let name = checked_name(collection)?;
        let dir = self.root.collection_dir(&name);
        if !dir.is_dir() {
            let err = ShelfError::CollectionNotFound(name);
            tracing::error!("{err}");
            return Err(err);
        }
        CollectionLedger::open(&dir, &name)
    }
}
