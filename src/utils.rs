use crate::error::{Result, ShelfError};
use chrono::Local;

/// Timestamp layout used in every metadata document.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lower-cases a user-supplied name and replaces spaces with underscores.
///
/// Collection directories, ledger files and stored artifacts are all named
/// through this, so `"Sales 2024"` and `"sales 2024"` address the same collection.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// [`normalize_name`], rejecting anything that is not a single plain path
/// component: empty names, `.`, `..`, and names holding a path separator or NUL.
///
/// # Errors
///
/// Returns [`ShelfError::InvalidName`], logged at error level.
pub fn checked_name(name: &str) -> Result<String> {
    let normalized = normalize_name(name);
    let reason = if normalized.is_empty() {
        Some("name is empty")
    } else if normalized == "." || normalized == ".." {
        Some("name refers to a directory")
    } else if normalized.contains(['/', '\\', '\0']) {
        Some("name contains a path separator or NUL")
    } else {
        None
    };

    match reason {
        None => Ok(normalized),
        Some(reason) => {
            let err = ShelfError::InvalidName {
                name: name.to_owned(),
                reason,
            };
            tracing::error!("{err}");
            Err(err)
        }
    }
}

/// Current local time formatted with [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
