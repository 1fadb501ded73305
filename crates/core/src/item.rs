//! Sort items: one materialized row of a record list.
//!
//! A `SortItem` carries three kinds of identity:
//!
//! - `key`: the object filters and sorters classify the row by
//! - `root`: the top-level backing object the row derives from
//! - `path`: the ids walked from the root (exclusive) down to the key
//!   (inclusive); empty when the key is the root
//!
//! Items are never mutated after construction; a stale item is replaced.

use crate::ids::ObjectId;
use crate::store::ObjectResolver;
use serde::{Deserialize, Serialize};

/// One displayed row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortItem {
    key: ObjectId,
    root: ObjectId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    path: Vec<ObjectId>,
}

impl SortItem {
    /// Creates a trivial item for a flat list: key and root are the same
    /// object and the path is empty.
    #[inline]
    pub fn new(root: ObjectId) -> Self {
        Self {
            key: root,
            root,
            path: Vec::new(),
        }
    }

    /// Creates an item with an explicit key, root and path.
    pub fn with_path(key: ObjectId, root: ObjectId, path: Vec<ObjectId>) -> Self {
        Self { key, root, path }
    }

    /// Returns the key object id.
    #[inline]
    pub fn key(&self) -> ObjectId {
        self.key
    }

    /// Returns the root object id.
    #[inline]
    pub fn root(&self) -> ObjectId {
        self.root
    }

    /// Returns the path from root to key.
    #[inline]
    pub fn path(&self) -> &[ObjectId] {
        &self.path
    }

    /// Iterates over every id this item depends on: key, path, then root.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        core::iter::once(self.key)
            .chain(self.path.iter().copied())
            .chain(core::iter::once(self.root))
    }

    /// Membership equality: two items stand for the same record when they
    /// share a root.
    #[inline]
    pub fn same_record(&self, other: &SortItem) -> bool {
        self.root == other.root
    }

    /// Classification equality used by filter and sort keys.
    #[inline]
    pub fn same_key(&self, other: &SortItem) -> bool {
        self.key == other.key
    }

    /// Returns true if `id` is the key or appears in the path. Deleting such
    /// an id invalidates the row even when the root survives.
    pub fn depends_on(&self, id: ObjectId) -> bool {
        self.key == id || self.path.contains(&id)
    }

    /// Walks key, path and root; the item is valid only if all resolve.
    pub fn is_valid<R: ObjectResolver + ?Sized>(&self, resolver: &R) -> bool {
        self.ids().all(|id| resolver.is_valid(id))
    }
}
