//! Content fingerprint of a dataset.
//!
//! The fingerprint depends on the multiset of rows and on the ordered column
//! names, never on row order. Each row is hashed to a `u64`, the row hashes
//! are folded together with XOR, and the folded value is digested with
//! SHA-256 along with the shape of the data.
//!
//! XOR folding is commutative, so shuffling rows leaves the fingerprint
//! unchanged. It also means a pair of identical rows cancels out; the row
//! count in the final digest keeps such frames apart from their deduplicated
//! versions.

use super::Tabular;
use crate::error::Result;
use sha2::{Digest as _, Sha256};

/// Separates a column name from its cell text.
const FIELD_SEPARATOR: u8 = 0x1f;
/// Terminates one (column, cell) pair.
const RECORD_SEPARATOR: u8 = 0x1e;

/// Hash one row given its `(column name, rendered cell)` pairs in column
/// order.
///
/// The result is the first eight bytes of the SHA-256 digest, little endian.
pub fn row_hash<'a>(cells: impl Iterator<Item = (&'a str, &'a str)>) -> u64 {
    let mut hasher = Sha256::new();
    for (column, cell) in cells {
        hasher.update(column.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(cell.as_bytes());
        hasher.update([RECORD_SEPARATOR]);
    }
    let digest = hasher.finalize();

    // A SHA-256 digest always has 32 bytes.
    digest
        .as_slice()
        .first_chunk::<8>()
        .copied()
        .map_or(0, u64::from_le_bytes)
}

/// Compute the fingerprint of `data` as 64 lowercase hex characters.
///
/// # Errors
///
/// Fails if the engine cannot produce its row hashes.
///
/// # Example
///
/// ```no_run
/// use datashelf::tabular::fingerprint::fingerprint;
/// use polars::prelude::*;
///
/// # fn example() -> datashelf::error::Result<()> {
/// let a = df!("x" => &[1, 2])?;
/// let b = df!("x" => &[2, 1])?;
/// assert_eq!(fingerprint(&a)?, fingerprint(&b)?);
/// # Ok(())
/// # }
/// ```
pub fn fingerprint(data: &dyn Tabular) -> Result<String> {
    let folded = data.hash_rows()?.into_iter().fold(0u64, |acc, h| acc ^ h);

    let mut hasher = Sha256::new();
    hasher.update(folded.to_string().as_bytes());
    hasher.update([RECORD_SEPARATOR]);
    hasher.update(data.row_count().to_string().as_bytes());
    for name in data.column_names() {
        hasher.update([RECORD_SEPARATOR]);
        hasher.update(name.as_bytes());
    }

    let hash = hasher.finalize();
    tracing::debug!(
        "Fingerprinted {} rows from {} engine",
        data.row_count(),
        data.engine()
    );
    Ok(format!("{hash:x}"))
}
