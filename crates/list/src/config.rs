//! List configuration.
//!
//! # Example
//!
//! ```rust
//! use folio_list::ListConfig;
//!
//! let config = ListConfig::from_json(r#"{ "name": "entries", "item_class": 2 }"#).unwrap();
//! assert!(config.primary);
//! assert_eq!(config.item_class, Some(2));
//! ```

use folio_core::{ClassId, Error, PropertyId, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of the persisted-list side file.
pub const CACHE_EXTENSION: &str = "folio-list.json";

/// Configuration of one materialized list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// List name, used for the cache file name and in logs.
    pub name: String,
    /// Only the primary list of a view persists its order.
    pub primary: bool,
    /// Directory holding the persisted-list side file.
    pub cache_dir: Option<PathBuf>,
    /// Class of the rows' root objects. Restoring from the cache is refused
    /// once an instance of it was created in this session.
    pub item_class: Option<ClassId>,
    /// Drop the visible rows while suppressed and inactive.
    pub clear_when_suppressed: bool,
    /// Aggregate properties whose changes force a full reload.
    pub watched_properties: Vec<PropertyId>,
    /// Class whose extent changes force a full reload.
    pub extent_class: Option<ClassId>,
    /// The candidate enumeration is already in display order.
    pub source_in_final_order: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            name: "records".into(),
            primary: true,
            cache_dir: None,
            item_class: None,
            clear_when_suppressed: false,
            watched_properties: Vec::new(),
            extent_class: None,
            source_in_final_order: false,
        }
    }
}

impl ListConfig {
    /// Creates a configuration with defaults and the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_config("list name cannot be empty"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(Error::invalid_config(format!(
                "list name {:?} cannot contain path separators",
                self.name
            )));
        }
        if let Some(dir) = &self.cache_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(Error::invalid_config(format!(
                    "cache dir {} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Path of the persisted-list side file, if a cache dir is set.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{CACHE_EXTENSION}", self.name)))
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_item_class(mut self, class: ClassId) -> Self {
        self.item_class = Some(class);
        self
    }

    pub fn with_clear_when_suppressed(mut self, clear: bool) -> Self {
        self.clear_when_suppressed = clear;
        self
    }

    /// Adds an aggregate property whose changes force a full reload.
    pub fn with_watched_property(mut self, property: PropertyId) -> Self {
        if !self.watched_properties.contains(&property) {
            self.watched_properties.push(property);
        }
        self
    }

    pub fn with_extent_class(mut self, class: ClassId) -> Self {
        self.extent_class = Some(class);
        self
    }

    pub fn with_source_in_final_order(mut self, in_order: bool) -> Self {
        self.source_in_final_order = in_order;
        self
    }
}
