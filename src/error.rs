//! Centralized error handling for datashelf.
//!
//! Every fallible operation in the library returns [`Result`], whose error side
//! is [`ShelfError`]. Variants map one-to-one onto the conditions a caller may
//! want to react to:
//!
//! ```
//! use datashelf::error::ShelfError;
//!
//! fn describe(err: &ShelfError) -> &'static str {
//!     match err {
//!         ShelfError::ProjectNotInitialized { .. } => "run `datashelf init` first",
//!         ShelfError::InvalidTag { .. } => "pick one of the allowed tags",
//!         ShelfError::CorruptState(_) => "inspect the .datashelf directory by hand",
//!         _ => "see the error message",
//!     }
//! }
//! ```
//!
//! A duplicate save is *not* an error; it is reported through
//! [`crate::shelf::SaveOutcome::Duplicate`].
//!
//! ## Context
//!
//! [`ResultExt`] adds `.context()` to any result whose error converts into
//! [`ShelfError`]. The original error is kept as the source, so callers can
//! still match on it through [`ShelfError::root_cause`].

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for datashelf operations.
#[derive(Debug)]
pub enum ShelfError {
    /// No `.datashelf` directory (with its index document) above the start directory
    ProjectNotInitialized { searched_from: PathBuf },

    /// The named collection has no directory under the root marker
    CollectionNotFound(String),

    /// A metadata document is missing, malformed, or violates its invariants
    CorruptState(String),

    /// A collection, snapshot or tag name that cannot be used as a path component
    InvalidName { name: String, reason: &'static str },

    /// Tag enforcement is on and the tag is not in the allowed set
    InvalidTag { tag: String, allowed: Vec<String> },

    /// Input is not something a supported tabular engine can read
    UnsupportedInputType(String),

    /// No non-deleted entry in the collection carries the requested hash
    SnapshotNotFound { collection: String, hash: String },

    /// I/O errors (file operations), passed through unmodified
    Io(std::io::Error),

    /// YAML serialization errors
    Yaml(serde_yaml::Error),

    /// Tabular engine errors (Polars)
    DataProcessing(String),

    /// An error with added context
    Context {
        message: String,
        source: Box<ShelfError>,
    },
}

impl ShelfError {
    /// Strip any [`ShelfError::Context`] layers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for ShelfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectNotInitialized { searched_from } => write!(
                f,
                "No .datashelf directory found at or above {}. Run `datashelf init` first.",
                searched_from.display()
            ),
            Self::CollectionNotFound(name) => write!(
                f,
                "Collection '{name}' does not exist. Create it with `datashelf create-collection`."
            ),
            Self::CorruptState(msg) => write!(f, "Corrupt datashelf state: {msg}"),
            Self::InvalidName { name, reason } => write!(f, "Invalid name '{name}': {reason}"),
            Self::InvalidTag { tag, allowed } => write!(
                f,
                "'{tag}' is not a valid tag. Allowed tags: {}",
                allowed.join(", ")
            ),
            Self::UnsupportedInputType(msg) => write!(f, "Unsupported data type: {msg}"),
            Self::SnapshotNotFound { collection, hash } => {
                write!(f, "No snapshot with hash {hash} in collection '{collection}'")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Yaml(e) => write!(f, "YAML error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Context { message, source } => write!(f, "{message}: {source}"),
        }
    }
}

impl std::error::Error for ShelfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Yaml(e) => Some(e),
            Self::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShelfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ShelfError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

impl From<polars::error::PolarsError> for ShelfError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Log a filesystem failure at error level and pass the `io::Error` through.
///
/// ```ignore
/// fs::copy(&from, &to).map_err(io_failure("copy to", &to))?;
/// ```
pub(crate) fn io_failure<'a>(
    action: &'a str,
    path: &'a Path,
) -> impl FnOnce(std::io::Error) -> ShelfError + 'a {
    move |e| {
        tracing::error!("Failed to {action} {}: {e}", path.display());
        ShelfError::Io(e)
    }
}

/// Result type alias for datashelf operations.
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context and log the resulting error at error level.
    fn log_context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ShelfError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| ShelfError::Context {
            message: msg.into(),
            source: Box::new(e.into()),
        })
    }

    fn log_context(self, msg: impl Into<String>) -> Result<T> {
        self.context(msg).map_err(|err| {
            tracing::error!("{err}");
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ShelfError::Context {
            message: f(),
            source: Box::new(e.into()),
        })
    }
}
