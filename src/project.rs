//! Locating and initializing a datashelf project.
//!
//! A project is any directory holding a `.datashelf` marker directory with a
//! root index inside it. [`ProjectRoot`] is resolved once and then handed to
//! every operation, so nothing downstream depends on the process working
//! directory.

use crate::config::{CONFIG_FILE_NAME, TagPolicy};
use crate::error::{Result, ShelfError, io_failure};
use crate::metadata::RootIndex;
use crate::metadata::index::INDEX_FILE_NAME;
use crate::metadata::ledger::CollectionLedger;
use crate::utils::normalize_name;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the hidden root marker directory.
pub const MARKER_DIR: &str = ".datashelf";

/// Which directory [`locate`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// The `.datashelf` directory itself
    Marker,
    /// The directory containing `.datashelf`
    Project,
}

/// Walk from `start` up to the filesystem root looking for a `.datashelf`
/// directory. Never creates anything.
pub fn locate(start: &Path, kind: RootKind) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        let marker = dir.join(MARKER_DIR);
        marker.is_dir().then(|| match kind {
            RootKind::Marker => marker,
            RootKind::Project => dir.to_path_buf(),
        })
    })
}

/// Result of [`ProjectRoot::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyInitialized,
}

/// Resolved paths of an initialized project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    project_dir: PathBuf,
    shelf_dir: PathBuf,
}

impl ProjectRoot {
    /// Find the project enclosing `start`.
    ///
    /// # Errors
    ///
    /// [`ShelfError::ProjectNotInitialized`] if there is no marker directory,
    /// or if the marker has no root index.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = std::path::absolute(start).map_err(io_failure("resolve", start))?;
        let Some(project_dir) = locate(&start, RootKind::Project) else {
            let err = ShelfError::ProjectNotInitialized {
                searched_from: start,
            };
            tracing::error!("{err}");
            return Err(err);
        };

        let root = Self::at(&project_dir);
        if !root.index_path().is_file() {
            let err = ShelfError::ProjectNotInitialized {
                searched_from: start,
            };
            tracing::error!("{err} (marker has no {INDEX_FILE_NAME})");
            return Err(err);
        }
        Ok(root)
    }

    /// Create `.datashelf` in `project_dir` with a root index and the default
    /// tag policy.
    ///
    /// A marker directory that already has an index is left untouched. A
    /// marker without an index is re-attached: existing subdirectories are
    /// counted as collections.
    ///
    /// # Errors
    ///
    /// I/O or YAML errors while creating the marker directory and its documents.
    pub fn init(project_dir: &Path) -> Result<(Self, InitOutcome)> {
        let project_dir =
            std::path::absolute(project_dir).map_err(io_failure("resolve", project_dir))?;
        let root = Self::at(&project_dir);

        if root.shelf_dir.is_dir() && root.index_path().is_file() {
            tracing::info!(
                ".datashelf directory and metadata already initialized in {}",
                project_dir.display()
            );
            return Ok((root, InitOutcome::AlreadyInitialized));
        }

        fs::create_dir_all(&root.shelf_dir).map_err(io_failure("create", &root.shelf_dir))?;
        RootIndex::initialize(&root.shelf_dir)?;
        TagPolicy::default().save(&root.config_path())?;

        tracing::info!(
            ".datashelf directory with config and metadata files initialized in {}",
            project_dir.display()
        );
        Ok((root, InitOutcome::Initialized))
    }

    fn at(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            shelf_dir: project_dir.join(MARKER_DIR),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn shelf_dir(&self) -> &Path {
        &self.shelf_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.shelf_dir.join(INDEX_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.shelf_dir.join(CONFIG_FILE_NAME)
    }

    pub fn index(&self) -> RootIndex {
        RootIndex::new(&self.shelf_dir)
    }

    /// Directory of a collection; the name is normalized first.
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.shelf_dir.join(normalize_name(collection))
    }

    /// Ledger path of a collection; the name is normalized first.
    pub fn ledger_path(&self, collection: &str) -> PathBuf {
        let name = normalize_name(collection);
        self.shelf_dir
            .join(&name)
            .join(CollectionLedger::file_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_walks_up() -> Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(MARKER_DIR))?;
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested)?;

        assert_eq!(
            locate(&nested, RootKind::Project),
            Some(temp.path().to_path_buf())
        );
        assert_eq!(
            locate(&nested, RootKind::Marker),
            Some(temp.path().join(MARKER_DIR))
        );
        Ok(())
    }

    #[test]
    fn test_locate_ignores_marker_files() -> Result<()> {
        let temp = TempDir::new()?;
        // A plain file with the marker name does not count.
        fs::write(temp.path().join(MARKER_DIR), "")?;
        let found = locate(temp.path(), RootKind::Project);
        assert_ne!(found, Some(temp.path().to_path_buf()));
        Ok(())
    }

    #[test]
    fn test_discover_requires_init() -> Result<()> {
        let temp = TempDir::new()?;
        let result = ProjectRoot::discover(temp.path());
        // An enclosing directory of the temp dir could carry its own marker;
        // discovery must still never land on the temp dir itself.
        match result {
            Ok(root) => assert_ne!(root.project_dir(), temp.path()),
            Err(err) => assert!(matches!(err, ShelfError::ProjectNotInitialized { .. })),
        }
        Ok(())
    }

    #[test]
    fn test_marker_without_index_is_not_initialized() -> Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(MARKER_DIR))?;
        assert!(matches!(
            ProjectRoot::discover(temp.path()),
            Err(ShelfError::ProjectNotInitialized { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_init_then_discover_from_subdir() -> Result<()> {
        let temp = TempDir::new()?;
        let (root, outcome) = ProjectRoot::init(temp.path())?;
        assert_eq!(outcome, InitOutcome::Initialized);
        assert!(root.index_path().is_file());
        assert!(root.config_path().is_file());

        let sub = temp.path().join("notebooks");
        fs::create_dir(&sub)?;
        let found = ProjectRoot::discover(&sub)?;
        assert_eq!(found, root);

        let (_, again) = ProjectRoot::init(temp.path())?;
        assert_eq!(again, InitOutcome::AlreadyInitialized);
        Ok(())
    }

    #[test]
    fn test_collection_paths_are_normalized() -> Result<()> {
        let temp = TempDir::new()?;
        let (root, _) = ProjectRoot::init(temp.path())?;
        assert_eq!(
            root.ledger_path("Sales 2024"),
            root.shelf_dir()
                .join("sales_2024")
                .join("sales_2024_metadata.yaml")
        );
        Ok(())
    }
}
