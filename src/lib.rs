//! # datashelf - local version control for tabular datasets
//!
//! datashelf keeps named *collections* of dataset snapshots under a hidden
//! `.datashelf` directory at the top of a project. Every saved snapshot gets a
//! row-order-independent content hash, a monotonically increasing version, a
//! stage tag and a message. Identical content is detected and never stored
//! twice, and any snapshot can be retrieved again by its hash.
//!
//! ## Quick Start
//!
//! ```no_run
//! use datashelf::project::ProjectRoot;
//! use datashelf::shelf::{SaveRequest, Shelf};
//! use polars::prelude::*;
//! use std::path::Path;
//!
//! # fn example() -> datashelf::error::Result<()> {
//! let (root, _) = ProjectRoot::init(Path::new("."))?;
//! let shelf = Shelf::new(root);
//! shelf.create_collection("Sales 2024")?;
//!
//! let df = df!("region" => &["north", "south"], "units" => &[10, 12])?;
//! let outcome = shelf.save(&df, &SaveRequest::new("Sales 2024", "q1", "raw", "first extract"))?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout on disk
//!
//! ```text
//! .datashelf/
//!   datashelf_config.yaml          tag policy
//!   datashelf_metadata.yaml        root index
//!   sales_2024/
//!     sales_2024_metadata.yaml     collection ledger
//!     q1_raw.csv                   snapshot (Parquet when large)
//! ```
//!
//! ## Core Modules
//!
//! - [`project`]: finding and creating the `.datashelf` root
//! - [`shelf`]: the versioning engine (create, save, find, checkout, load)
//! - [`tabular`]: the [`tabular::Tabular`] capability, fingerprints and encoding
//! - [`metadata`]: the root index and collection ledger documents
//! - [`config`]: the tag policy
//! - [`display`]: Markdown tables for listing metadata
//! - [`error`]: error type shared by all of the above

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod project;
pub mod shelf;
pub mod tabular;
pub mod utils;
