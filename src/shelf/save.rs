//! Saving snapshots.

use super::Shelf;
use crate::error::Result;
use crate::metadata::FileEntry;
use crate::tabular::fingerprint::fingerprint;
use crate::tabular::{StorageFormat, Tabular};
use crate::utils::checked_name;
use std::path::PathBuf;

/// What to save and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub collection: String,
    pub name: String,
    pub tag: String,
    pub message: String,
}

impl SaveRequest {
    pub fn new(
        collection: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            name: name.into(),
            tag: tag.into(),
            message: message.into(),
        }
    }
}

/// A snapshot that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub version: u64,
    pub hash: String,
    pub path: PathBuf,
    pub format: StorageFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SavedSnapshot),
    /// The collection already holds identical content; nothing was written.
    Duplicate { existing_name: String, hash: String },
}

impl Shelf {
    /// Save `data` as a new snapshot in `request.collection`.
    ///
    /// The tag is checked against the policy before anything else is read.
    /// Content already present in the collection (by fingerprint) is reported
    /// as [`SaveOutcome::Duplicate`] and does not consume a version number.
    ///
    /// The artifact is written to `<collection>/<name>_<tag>.<ext>`; saving
    /// the same name and tag again replaces that file.
    ///
    /// # Errors
    ///
    /// - `InvalidTag` when enforcement is on and the tag is not allowed
    /// - `InvalidName` when the collection, name or tag cannot form a file name
    /// - `CollectionNotFound` / `CorruptState` from resolving the ledger
    /// - I/O, YAML or engine errors while writing the artifact and documents
    pub fn save(&self, data: &dyn Tabular, request: &SaveRequest) -> Result<SaveOutcome> {
        self.tag_policy()?.check(&request.tag)?;
        let stem_name = format!(
            "{}_{}",
            checked_name(&request.name)?,
            checked_name(&request.tag)?
        );

        let hash = fingerprint(data)?;
        let ledger = self.ledger(&request.collection)?;

        if let Some(existing) = ledger.find_by_hash(&hash)? {
            tracing::warn!(
                "Duplicate content: '{}' in collection '{}' already has hash {hash}",
                existing.name,
                ledger.collection()
            );
            return Ok(SaveOutcome::Duplicate {
                existing_name: existing.name,
                hash,
            });
        }

        let version = ledger.next_version()?;
        let stem = self.root.collection_dir(ledger.collection()).join(stem_name);
        let artifact = self.encoder.choose_and_write(data, &stem)?;

        ledger.record_file(
            FileEntry::snapshot(
                request.name.as_str(),
                hash.as_str(),
                request.tag.as_str(),
                request.message.as_str(),
                version,
                artifact.path.clone(),
            )
            .with_schema(data.column_specs()),
        )?;
        ledger.update_summary(&artifact.path, version)?;
        self.index().refresh_collection_files(&ledger)?;

        tracing::info!(
            "Saved '{}' to collection '{}' as version {version} ({})",
            request.name,
            ledger.collection(),
            artifact.format
        );
        Ok(SaveOutcome::Saved(SavedSnapshot {
            version,
            hash,
            path: artifact.path,
            format: artifact.format,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelfError;
    use crate::project::ProjectRoot;
    use crate::tabular::StorageEncoder;
    use polars::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn shelf_with_collection(temp: &TempDir) -> Result<Shelf> {
        let (root, _) = ProjectRoot::init(temp.path())?;
        let shelf = Shelf::new(root);
        shelf.create_collection("Sales 2024")?;
        Ok(shelf)
    }

    fn sales() -> Result<DataFrame> {
        Ok(df!(
            "region" => &["north", "south", "east", "west", "north"],
            "units" => &[10, 12, 7, 3, 9]
        )?)
    }

    fn saved(outcome: SaveOutcome) -> SavedSnapshot {
        match outcome {
            SaveOutcome::Saved(snapshot) => snapshot,
            SaveOutcome::Duplicate { existing_name, .. } => {
                panic!("expected a new snapshot, got duplicate of {existing_name}")
            }
        }
    }

    #[test]
    fn test_first_save() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        let request = SaveRequest::new("Sales 2024", "q1", "raw", "first extract");

        let snapshot = saved(shelf.save(&sales()?, &request)?);
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.format, StorageFormat::Csv);
        assert!(snapshot.path.ends_with("sales_2024/q1_raw.csv"));
        assert!(snapshot.path.is_file());

        let doc = shelf.ledger("Sales 2024")?.read()?;
        assert_eq!(doc.metadata.file_count, 2);
        assert_eq!(doc.metadata.max_version, 1);
        assert_eq!(
            doc.metadata.most_recent_commit,
            snapshot.path.display().to_string()
        );
        let entry = &doc.files[1];
        assert_eq!(entry.hash, snapshot.hash);
        assert_eq!(entry.version, Some(1));
        assert_eq!(entry.message, "first extract");
        Ok(())
    }

    #[test]
    fn test_duplicate_does_not_consume_version() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        let first = saved(shelf.save(
            &sales()?,
            &SaveRequest::new("Sales 2024", "q1", "raw", ""),
        )?);

        let again = shelf.save(&sales()?, &SaveRequest::new("Sales 2024", "q1_copy", "raw", ""))?;
        assert_eq!(
            again,
            SaveOutcome::Duplicate {
                existing_name: "q1".to_owned(),
                hash: first.hash,
            }
        );

        let changed = df!("region" => &["north"], "units" => &[1])?;
        let second = saved(shelf.save(&changed, &SaveRequest::new("Sales 2024", "q2", "raw", ""))?);
        assert_eq!(second.version, 2);

        let collection_dir = shelf.root().collection_dir("sales_2024");
        assert!(!collection_dir.join("q1_copy_raw.csv").exists());
        Ok(())
    }

    #[test]
    fn test_invalid_tag_touches_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        let ledger_before = shelf.ledger("sales_2024")?.read()?;

        let result = shelf.save(&sales()?, &SaveRequest::new("sales_2024", "q1", "bogus", ""));
        assert!(matches!(result, Err(ShelfError::InvalidTag { tag, .. }) if tag == "bogus"));

        assert_eq!(shelf.ledger("sales_2024")?.read()?, ledger_before);
        let entries = fs::read_dir(shelf.root().collection_dir("sales_2024"))?.count();
        assert_eq!(entries, 1);
        Ok(())
    }

    #[test]
    fn test_snapshot_name_cannot_leave_collection() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        shelf.set_tag_enforcement(false)?;
        let ledger_before = shelf.ledger("sales_2024")?.read()?;

        for (name, tag) in [("../../outside", "raw"), ("q1", "../x"), ("", "raw")] {
            let result = shelf.save(&sales()?, &SaveRequest::new("sales_2024", name, tag, ""));
            assert!(
                matches!(result, Err(ShelfError::InvalidName { .. })),
                "{name:?}/{tag:?} should be rejected"
            );
        }
        assert!(matches!(
            shelf.save(&sales()?, &SaveRequest::new("../sales_2024", "q1", "raw", "")),
            Err(ShelfError::InvalidName { .. })
        ));

        assert_eq!(shelf.ledger("sales_2024")?.read()?, ledger_before);
        assert!(!temp.path().join("outside_raw.csv").exists());
        assert!(!shelf.root().shelf_dir().join("outside_raw.csv").exists());
        Ok(())
    }

    #[test]
    fn test_ledger_records_column_types() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        let snapshot = saved(shelf.save(&sales()?, &SaveRequest::new("sales_2024", "q1", "raw", ""))?);

        let entry = shelf.find_snapshot("sales_2024", &snapshot.hash)?;
        let types: Vec<&str> = entry.schema.iter().map(|c| c.dtype.as_str()).collect();
        assert_eq!(types, vec!["str", "i32"]);
        Ok(())
    }

    #[test]
    fn test_any_tag_when_enforcement_off() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        shelf.set_tag_enforcement(false)?;

        let snapshot = saved(shelf.save(
            &sales()?,
            &SaveRequest::new("sales_2024", "q1", "Experimental Run", ""),
        )?);
        assert!(snapshot.path.ends_with("q1_experimental_run.csv"));
        Ok(())
    }

    #[test]
    fn test_large_frame_goes_to_parquet() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?.with_encoder(StorageEncoder::with_threshold(16));

        let snapshot = saved(shelf.save(&sales()?, &SaveRequest::new("sales_2024", "q1", "raw", ""))?);
        assert_eq!(snapshot.format, StorageFormat::Parquet);
        assert!(snapshot.path.ends_with("q1_raw.parquet"));
        assert!(!snapshot.path.with_extension("csv").exists());
        Ok(())
    }

    #[test]
    fn test_save_into_missing_collection() -> Result<()> {
        let temp = TempDir::new()?;
        let (root, _) = ProjectRoot::init(temp.path())?;
        let shelf = Shelf::new(root);

        assert!(matches!(
            shelf.save(&sales()?, &SaveRequest::new("ghost", "q1", "raw", "")),
            Err(ShelfError::CollectionNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_index_tracks_saved_files() -> Result<()> {
        let temp = TempDir::new()?;
        let shelf = shelf_with_collection(&temp)?;
        shelf.save(&sales()?, &SaveRequest::new("sales_2024", "q1", "raw", ""))?;

        let doc = shelf.index().read()?;
        let detail = doc.detail("sales_2024").expect("detail record");
        assert_eq!(
            detail.files,
            vec!["sales_2024_metadata.yaml".to_owned(), "q1".to_owned()]
        );
        Ok(())
    }
}
