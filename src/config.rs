//! Project configuration: the tag policy (`datashelf_config.yaml`).
//!
//! The policy is written once by `init` and afterwards only changed through
//! [`TagPolicy::set_enforcement`].

use crate::error::{Result, ShelfError};
use crate::metadata::{read_document, write_document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the tag policy inside the marker directory.
pub const CONFIG_FILE_NAME: &str = "datashelf_config.yaml";

/// Tags accepted out of the box.
pub const DEFAULT_ALLOWED_TAGS: [&str; 5] = ["raw", "intermediate", "cleaned", "ad-hoc", "final"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagPolicy {
    pub tag_enforcement: bool,
    pub allowed_tags: Vec<String>,
    /// Per-collection allowed tags. Reserved: written empty, never consulted.
    #[serde(default)]
    pub collection_tag_overrides: BTreeMap<String, Vec<String>>,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            tag_enforcement: true,
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| (*t).to_owned()).collect(),
            collection_tag_overrides: BTreeMap::new(),
        }
    }
}

impl TagPolicy {
    /// # Errors
    ///
    /// `CorruptState` when the policy file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        read_document(path, "Tag policy")
    }

    /// # Errors
    ///
    /// I/O or YAML errors writing `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_document(path, self)
    }

    /// Toggle enforcement and persist the policy.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::load`] and [`Self::save`].
    pub fn set_enforcement(path: &Path, enforced: bool) -> Result<Self> {
        let mut policy = Self::load(path)?;
        policy.tag_enforcement = enforced;
        policy.save(path)?;
        tracing::info!(
            "Tag enforcement {}",
            if enforced { "enabled" } else { "disabled" }
        );
        Ok(policy)
    }

    pub fn is_allowed(&self, tag: &str) -> bool {
        !self.tag_enforcement || self.allowed_tags.iter().any(|t| t == tag)
    }

    /// # Errors
    ///
    /// [`ShelfError::InvalidTag`] when enforcement is on and `tag` is not
    /// allowed.
    pub fn check(&self, tag: &str) -> Result<()> {
        if self.is_allowed(tag) {
            return Ok(());
        }
        let err = ShelfError::InvalidTag {
            tag: tag.to_owned(),
            allowed: self.allowed_tags.clone(),
        };
        tracing::error!("{err}");
        Err(err)
    }
}
