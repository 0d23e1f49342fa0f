//! Tabular data capability and the Polars adapter.
//!
//! The versioning engine never inspects a dataset directly. Everything it
//! needs goes through the [`Tabular`] trait:
//!
//! - per-row hashes for the content fingerprint ([`fingerprint`])
//! - an in-memory size estimate for the encoding choice ([`storage`])
//! - encoding to CSV or Parquet, and decoding back with the saved column types
//!
//! Polars' [`DataFrame`] is the only implementation. Input files are mapped to
//! an engine in exactly one place, [`read_input`]; anything it does not
//! recognize is rejected with [`ShelfError::UnsupportedInputType`].
//!
//! ```no_run
//! use datashelf::tabular::{Tabular, fingerprint};
//! use polars::prelude::*;
//!
//! # fn example() -> datashelf::error::Result<()> {
//! let df = df!("id" => &[1, 2, 3], "name" => &["a", "b", "c"])?;
//! println!("{} rows, hash {}", df.row_count(), fingerprint::fingerprint(&df)?);
//! # Ok(())
//! # }
//! ```

pub mod fingerprint;
pub mod storage;

pub use storage::{StorageEncoder, StorageFormat, StoredArtifact};

use crate::error::{Result, ResultExt as _, ShelfError, io_failure};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Name and type of one column, recorded in the ledger so a CSV artifact can be
/// read back with the types it was saved with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: String,
}

/// Capabilities a tabular engine must provide to be versioned.
pub trait Tabular {
    /// Short engine identifier used in log messages.
    fn engine(&self) -> &'static str;

    fn row_count(&self) -> usize;

    /// Column names in order.
    fn column_names(&self) -> Vec<String>;

    /// Column names and types in order.
    fn column_specs(&self) -> Vec<ColumnSpec>;

    /// One hash per row, in row order. See [`fingerprint::row_hash`].
    ///
    /// # Errors
    ///
    /// Fails if a cell cannot be read.
    fn hash_rows(&self) -> Result<Vec<u64>>;

    /// Estimated in-memory footprint in bytes, text payloads included.
    fn footprint_bytes(&self) -> usize;

    /// Write the data to `path` in `format`. No row-label column is written.
    ///
    /// # Errors
    ///
    /// I/O errors creating the file and engine errors while writing it.
    fn encode(&self, path: &Path, format: StorageFormat) -> Result<()>;

    /// Read data previously written by [`Tabular::encode`].
    ///
    /// Columns listed in `columns` are read as the recorded type instead of
    /// the inferred one. Parquet carries its own types and ignores them.
    ///
    /// # Errors
    ///
    /// I/O errors opening the file and engine errors while parsing it.
    fn decode(path: &Path, format: StorageFormat, columns: &[ColumnSpec]) -> Result<Self>
    where
        Self: Sized;
}

impl Tabular for DataFrame {
    fn engine(&self) -> &'static str {
        "polars"
    }

    fn row_count(&self) -> usize {
        self.height()
    }

    fn column_names(&self) -> Vec<String> {
        self.get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn column_specs(&self) -> Vec<ColumnSpec> {
        self.get_columns()
            .iter()
            .map(|column| ColumnSpec {
                name: column.name().to_string(),
                dtype: dtype_name(column.dtype()),
            })
            .collect()
    }

    fn hash_rows(&self) -> Result<Vec<u64>> {
        let columns = self.get_columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name().as_str()).collect();

        let mut hashes = Vec::with_capacity(self.height());
        let mut cells: Vec<String> = Vec::with_capacity(columns.len());
        for row in 0..self.height() {
            cells.clear();
            for column in columns {
                cells.push(render_cell(&column.get(row)?));
            }
            hashes.push(fingerprint::row_hash(
                names.iter().copied().zip(cells.iter().map(String::as_str)),
            ));
        }
        Ok(hashes)
    }

    fn footprint_bytes(&self) -> usize {
        self.estimated_size()
    }

    fn encode(&self, path: &Path, format: StorageFormat) -> Result<()> {
        let mut df = self.clone();
        let file = File::create(path).map_err(io_failure("create", path))?;

        match format {
            StorageFormat::Csv => {
                CsvWriter::new(file)
                    .include_header(true)
                    .finish(&mut df)
                    .log_context(format!("Failed to write CSV file {}", path.display()))?;
            }
            StorageFormat::Parquet => {
                ParquetWriter::new(file)
                    .finish(&mut df)
                    .log_context(format!("Failed to write Parquet file {}", path.display()))?;
            }
        }
        Ok(())
    }

    fn decode(path: &Path, format: StorageFormat, columns: &[ColumnSpec]) -> Result<Self> {
        match format {
            StorageFormat::Csv => {
                let mut schema = Schema::default();
                for spec in columns {
                    match parse_dtype(&spec.dtype) {
                        Some(dtype) => {
                            schema.with_column(spec.name.as_str().into(), dtype);
                        }
                        None => tracing::debug!(
                            "Column '{}' has type {}, inferring it instead",
                            spec.name,
                            spec.dtype
                        ),
                    }
                }
                let overwrite = (!schema.is_empty()).then(|| Arc::new(schema));

                LazyCsvReader::new(path)
                    .with_has_header(true)
                    .with_infer_schema_length(None)
                    .with_dtype_overwrite(overwrite)
                    .finish()
                    .and_then(LazyFrame::collect)
                    .log_context(format!("Failed to read CSV {}", path.display()))
            }
            StorageFormat::Parquet => {
                let file = File::open(path).map_err(io_failure("open", path))?;
                ParquetReader::new(file)
                    .finish()
                    .log_context(format!("Failed to read Parquet {}", path.display()))
            }
        }
    }
}

/// Recorded name of a column type. Types without a CSV-safe mapping keep
/// Polars' own display name and are inferred again on decode.
fn dtype_name(dtype: &DataType) -> String {
    match dtype {
        DataType::Boolean => "bool".to_owned(),
        DataType::Int32 => "i32".to_owned(),
        DataType::Int64 => "i64".to_owned(),
        DataType::UInt32 => "u32".to_owned(),
        DataType::UInt64 => "u64".to_owned(),
        DataType::Float32 => "f32".to_owned(),
        DataType::Float64 => "f64".to_owned(),
        DataType::String => "str".to_owned(),
        other => other.to_string(),
    }
}

fn parse_dtype(name: &str) -> Option<DataType> {
    match name {
        "bool" => Some(DataType::Boolean),
        "i32" => Some(DataType::Int32),
        "i64" => Some(DataType::Int64),
        "u32" => Some(DataType::UInt32),
        "u64" => Some(DataType::UInt64),
        "f32" => Some(DataType::Float32),
        "f64" => Some(DataType::Float64),
        "str" => Some(DataType::String),
        _ => None,
    }
}

/// Text form of one cell for row hashing. Nulls and strings are rendered so
/// they cannot collide with each other or with numbers.
fn render_cell(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => "\u{0}".to_owned(),
        AnyValue::String(s) => format!("\"{s}\""),
        AnyValue::StringOwned(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

/// Read a user-supplied input file into a [`DataFrame`].
///
/// CSV and Parquet go through [`Tabular::decode`] with inferred types; JSON is
/// accepted as input only.
///
/// # Errors
///
/// [`ShelfError::UnsupportedInputType`] for any other extension, otherwise
/// whatever opening or parsing the file reports.
pub fn read_input(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => DataFrame::decode(path, StorageFormat::Csv, &[]),
        "parquet" => DataFrame::decode(path, StorageFormat::Parquet, &[]),
        "json" => {
            let file = File::open(path).map_err(io_failure("open", path))?;
            JsonReader::new(file)
                .finish()
                .log_context(format!("Failed to read JSON {}", path.display()))
        }
        _ => {
            let err = ShelfError::UnsupportedInputType(format!(
                "{} (expected .csv, .parquet or .json)",
                path.display()
            ));
            tracing::error!("{err}");
            Err(err)
        }
    }
}
