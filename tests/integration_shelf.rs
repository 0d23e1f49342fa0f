//! End-to-end tests for the versioning workflow.
//!
//! Each test builds a fresh project in a temporary directory and drives it
//! through the public API only, the same way the CLI does.

use datashelf::error::{Result, ShelfError};
use datashelf::project::{InitOutcome, ProjectRoot};
use datashelf::shelf::{CollectionOutcome, SaveOutcome, SaveRequest, SavedSnapshot, Shelf};
use datashelf::tabular::fingerprint::fingerprint;
use datashelf::tabular::{StorageFormat, read_input};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from("testdata").join(name)
}

fn new_project(temp: &TempDir) -> Result<Shelf> {
    let (root, outcome) = ProjectRoot::init(temp.path())?;
    assert_eq!(outcome, InitOutcome::Initialized);
    Ok(Shelf::new(root))
}

fn expect_saved(outcome: SaveOutcome) -> SavedSnapshot {
    match outcome {
        SaveOutcome::Saved(snapshot) => snapshot,
        SaveOutcome::Duplicate { existing_name, .. } => {
            panic!("expected a new snapshot, got duplicate of {existing_name}")
        }
    }
}

fn artifact_count(dir: &Path, ext: &str) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.path().extension().is_some_and(|e| e == ext) {
            count += 1;
        }
    }
    Ok(count)
}

#[test]
fn test_sales_workflow() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    assert_eq!(
        shelf.create_collection("Sales 2024")?,
        CollectionOutcome::Created
    );

    let df = read_input(&fixture("sales_q1.csv"))?;
    assert_eq!(df.height(), 5);

    let first = expect_saved(shelf.save(
        &df,
        &SaveRequest::new("Sales 2024", "q1", "raw", "first extract"),
    )?);
    assert_eq!(first.version, 1);
    assert_eq!(first.format, StorageFormat::Csv);

    let ledger = shelf.ledger("Sales 2024")?.read()?;
    assert_eq!(ledger.metadata.file_count, 2);
    assert_eq!(ledger.metadata.max_version, 1);

    // Same rows in a different order, under a different name.
    let shuffled = read_input(&fixture("sales_q1_shuffled.csv"))?;
    let again = shelf.save(
        &shuffled,
        &SaveRequest::new("Sales 2024", "q1_again", "raw", ""),
    )?;
    assert_eq!(
        again,
        SaveOutcome::Duplicate {
            existing_name: "q1".to_owned(),
            hash: first.hash.clone(),
        }
    );

    let ledger = shelf.ledger("Sales 2024")?.read()?;
    assert_eq!(ledger.metadata.max_version, 1);
    assert_eq!(ledger.files.len(), 2);
    let dir = shelf.root().collection_dir("Sales 2024");
    assert_eq!(artifact_count(&dir, "csv")?, 1);
    Ok(())
}

#[test]
fn test_versions_increase_past_duplicates() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("metrics")?;

    let mut versions = Vec::new();
    for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
        let df = df!("step" => &[i as i64], "value" => &[i as f64 * 1.5])?;
        let request = SaveRequest::new("metrics", name, "intermediate", "");
        versions.push(expect_saved(shelf.save(&df, &request)?).version);

        // Re-saving identical content never burns a version.
        let dup = shelf.save(&df, &SaveRequest::new("metrics", "dup", "intermediate", ""))?;
        assert!(matches!(dup, SaveOutcome::Duplicate { .. }));
    }
    assert_eq!(versions, vec![1, 2, 3]);

    let ledger = shelf.ledger("metrics")?.read()?;
    let recorded: Vec<u64> = ledger.files.iter().filter_map(|f| f.version).collect();
    assert_eq!(recorded, versions);
    assert_eq!(ledger.metadata.max_version, 3);
    Ok(())
}

#[test]
fn test_large_frame_stored_as_parquet() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("big")?;

    // 1.4M i64 values is a little over 10 MiB in memory.
    let ids: Vec<i64> = (0..1_400_000).collect();
    let df = df!("id" => ids)?;
    assert!(df.estimated_size() > 10 * 1024 * 1024);

    let snapshot = expect_saved(shelf.save(&df, &SaveRequest::new("big", "ids", "raw", ""))?);
    assert_eq!(snapshot.format, StorageFormat::Parquet);

    let dir = shelf.root().collection_dir("big");
    assert_eq!(artifact_count(&dir, "parquet")?, 1);
    assert_eq!(artifact_count(&dir, "csv")?, 0);

    let back = shelf.load("big", &snapshot.hash)?;
    assert_eq!(back.height(), 1_400_000);
    Ok(())
}

#[test]
fn test_bogus_tag_rejected_without_side_effects() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("Sales 2024")?;

    let index_before = shelf.index().read()?;
    let ledger_before = shelf.ledger("Sales 2024")?.read()?;

    let df = read_input(&fixture("sales_q1.csv"))?;
    let result = shelf.save(&df, &SaveRequest::new("Sales 2024", "q1", "bogus", ""));
    match result {
        Err(ShelfError::InvalidTag { tag, allowed }) => {
            assert_eq!(tag, "bogus");
            assert!(allowed.contains(&"cleaned".to_owned()));
        }
        other => panic!("expected InvalidTag, got {other:?}"),
    }

    assert_eq!(shelf.index().read()?, index_before);
    assert_eq!(shelf.ledger("Sales 2024")?.read()?, ledger_before);

    // Lifting enforcement lets the same tag through.
    shelf.set_tag_enforcement(false)?;
    let snapshot = expect_saved(shelf.save(&df, &SaveRequest::new("Sales 2024", "q1", "bogus", ""))?);
    assert!(snapshot.path.ends_with("q1_bogus.csv"));
    Ok(())
}

#[test]
fn test_index_mirrors_ledgers() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("first")?;
    shelf.create_collection("second")?;

    let df = read_input(&fixture("sales_q1.csv"))?;
    shelf.save(&df, &SaveRequest::new("first", "q1", "raw", ""))?;
    let json = read_input(&fixture("sales_q1.json"))?;
    shelf.save(&json, &SaveRequest::new("second", "from_json", "cleaned", ""))?;

    let index = shelf.index().read()?;
    assert_eq!(index.metadata.collection_count, 2);
    assert_eq!(
        index.metadata.collections.len(),
        index.metadata.collection_count as usize
    );

    for name in ["first", "second"] {
        let detail = index.detail(name).expect("collection registered");
        let live: Vec<String> = shelf
            .ledger(name)?
            .read()?
            .active_files()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(detail.files, live);
    }
    Ok(())
}

#[test]
fn test_checkout_and_load_by_hash() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("sales")?;

    let df = read_input(&fixture("sales_q1.csv"))?;
    let snapshot = expect_saved(shelf.save(&df, &SaveRequest::new("sales", "q1", "final", ""))?);

    let dest = temp.path().join("export");
    let copy = shelf.checkout("sales", &snapshot.hash, &dest)?;
    assert_eq!(copy.file_name(), snapshot.path.file_name());
    assert_eq!(fs::read(&copy)?, fs::read(&snapshot.path)?);

    let loaded = shelf.load("sales", &snapshot.hash)?;
    assert_eq!(loaded.shape(), df.shape());
    assert_eq!(fingerprint(&loaded)?, snapshot.hash);

    assert!(matches!(
        shelf.checkout("sales", "0000", &dest),
        Err(ShelfError::SnapshotNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_load_restores_saved_types() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("stores")?;

    let df = df!(
        "store" => &["a", "b", "c"],
        "zip" => &["01234", "02110", "00501"],
        "staff" => &[4i32, 11, 7],
        "revenue" => &[1200.5f64, 830.0, 99.75]
    )?;
    let snapshot = expect_saved(shelf.save(&df, &SaveRequest::new("stores", "list", "raw", ""))?);
    assert_eq!(snapshot.format, StorageFormat::Csv);

    let back = shelf.load("stores", &snapshot.hash)?;
    assert_eq!(back.dtypes(), df.dtypes());
    assert!(back.equals(&df));
    assert_eq!(back.column("zip")?.str()?.get(0), Some("01234"));
    Ok(())
}

#[test]
fn test_names_stay_inside_shelf() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;

    assert!(matches!(
        shelf.create_collection("../escape"),
        Err(ShelfError::InvalidName { .. })
    ));
    assert!(!temp.path().join("escape").exists());

    shelf.create_collection("sales")?;
    let df = read_input(&fixture("sales_q1.csv"))?;
    assert!(matches!(
        shelf.save(&df, &SaveRequest::new("sales", "../../outside", "raw", "")),
        Err(ShelfError::InvalidName { .. })
    ));
    assert!(!temp.path().join("outside_raw.csv").exists());
    assert_eq!(shelf.ledger("sales")?.read()?.metadata.max_version, 0);
    Ok(())
}

#[test]
fn test_checkout_into_own_dir_by_other_spelling() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    shelf.create_collection("sales")?;

    let df = read_input(&fixture("sales_q1.csv"))?;
    let snapshot = expect_saved(shelf.save(&df, &SaveRequest::new("sales", "q1", "raw", ""))?);
    let before = fs::read(&snapshot.path)?;

    let detour = shelf.root().shelf_dir().join("sales").join("..").join("sales");
    shelf.checkout("sales", &snapshot.hash, &detour)?;
    assert_eq!(fs::read(&snapshot.path)?, before);
    assert_eq!(fingerprint(&shelf.load("sales", &snapshot.hash)?)?, snapshot.hash);
    Ok(())
}

#[test]
fn test_operations_require_init() -> Result<()> {
    let temp = TempDir::new()?;
    let nested = temp.path().join("not/a/project");
    fs::create_dir_all(&nested)?;

    match Shelf::open(&nested) {
        Err(ShelfError::ProjectNotInitialized { .. }) => {}
        // An ancestor of the temp dir may itself be a project; it must not
        // resolve to anything inside the temp dir.
        Ok(shelf) => assert!(!shelf.root().project_dir().starts_with(temp.path())),
        Err(other) => panic!("unexpected error: {other}"),
    }

    ProjectRoot::init(temp.path())?;
    let shelf = Shelf::open(&nested)?;
    assert_eq!(shelf.root().project_dir(), temp.path());

    let (_, outcome) = ProjectRoot::init(temp.path())?;
    assert_eq!(outcome, InitOutcome::AlreadyInitialized);
    Ok(())
}

#[test]
fn test_unsupported_input_type() {
    assert!(matches!(
        read_input(&fixture("sales_q1.tsv")),
        Err(ShelfError::UnsupportedInputType(_))
    ));
}

#[test]
fn test_default_tag_policy_after_init() -> Result<()> {
    let temp = TempDir::new()?;
    let shelf = new_project(&temp)?;
    let policy = shelf.tag_policy()?;
    assert!(policy.tag_enforcement);
    assert_eq!(
        policy.allowed_tags,
        vec!["raw", "intermediate", "cleaned", "ad-hoc", "final"]
    );
    Ok(())
}
