//! Schema knowledge that descriptors are validated against.
//!
//! A descriptor persisted in one session can outlive the field or writing
//! system it names. Reconstruction checks every reference here first.

use folio_core::{Error, Result};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// String comparison rule attached to a writing system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collation {
    /// Byte-wise comparison.
    #[default]
    Ordinal,
    /// Comparison after lower-casing both sides.
    CaseInsensitive,
}

impl Collation {
    /// Normalizes a value so that plain `Ord` on the result follows this
    /// collation.
    pub fn normalize(&self, value: &str) -> String {
        match self {
            Collation::Ordinal => value.to_owned(),
            Collation::CaseInsensitive => value.to_lowercase(),
        }
    }

    /// Compares two values under this collation.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Collation::Ordinal => a.cmp(b),
            Collation::CaseInsensitive => self.normalize(a).cmp(&self.normalize(b)),
        }
    }
}

/// The fields and writing systems currently defined.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: HashSet<String>,
    writing_systems: HashMap<String, Collation>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into());
        self
    }

    /// Adds a writing system and its collation.
    pub fn with_writing_system(mut self, id: impl Into<String>, collation: Collation) -> Self {
        self.writing_systems.insert(id.into(), collation);
        self
    }

    /// Removes a field, as when a custom field is deleted.
    pub fn remove_field(&mut self, name: &str) -> bool {
        self.fields.remove(name)
    }

    /// Returns true if the field exists.
    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Checks that a field exists.
    pub fn require_field(&self, name: &str) -> Result<()> {
        if self.has_field(name) {
            Ok(())
        } else {
            Err(Error::unknown_field(name))
        }
    }

    /// Resolves a writing system id to its collation.
    pub fn collation(&self, ws: &str) -> Result<Collation> {
        self.writing_systems
            .get(ws)
            .copied()
            .ok_or_else(|| Error::unknown_writing_system(ws))
    }
}
