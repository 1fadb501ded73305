//! Typed change notifications published by a backing store.

use crate::ids::{ClassId, ObjectId, PropertyId};

/// A mutation of the backing store.
///
/// Vector-property edits carry the affected range and the ids involved so
/// that consumers can tell single-item edits from bulk ones and can check
/// deleted ids against rows that depend on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Ids were inserted into `(owner, property)` starting at `index`.
    Inserted {
        owner: ObjectId,
        property: PropertyId,
        index: usize,
        ids: Vec<ObjectId>,
    },
    /// Ids were removed from `(owner, property)` starting at `index`.
    Deleted {
        owner: ObjectId,
        property: PropertyId,
        index: usize,
        ids: Vec<ObjectId>,
    },
    /// A range of `(owner, property)` was replaced.
    Replaced {
        owner: ObjectId,
        property: PropertyId,
        index: usize,
        inserted: Vec<ObjectId>,
        deleted: Vec<ObjectId>,
    },
    /// A scalar property changed.
    Modified {
        object: ObjectId,
        property: PropertyId,
    },
    /// The set of live instances of `class` changed.
    ExtentChanged {
        class: ClassId,
        inserted: Vec<ObjectId>,
        deleted: Vec<ObjectId>,
    },
}

impl ChangeEvent {
    /// Creates a single-id insertion.
    pub fn inserted(owner: ObjectId, property: PropertyId, index: usize, id: ObjectId) -> Self {
        ChangeEvent::Inserted {
            owner,
            property,
            index,
            ids: vec![id],
        }
    }

    /// Creates a single-id deletion.
    pub fn deleted(owner: ObjectId, property: PropertyId, index: usize, id: ObjectId) -> Self {
        ChangeEvent::Deleted {
            owner,
            property,
            index,
            ids: vec![id],
        }
    }

    /// Returns the object whose property changed. Extent changes have none.
    pub fn owner(&self) -> Option<ObjectId> {
        match self {
            ChangeEvent::Inserted { owner, .. }
            | ChangeEvent::Deleted { owner, .. }
            | ChangeEvent::Replaced { owner, .. } => Some(*owner),
            ChangeEvent::Modified { object, .. } => Some(*object),
            ChangeEvent::ExtentChanged { .. } => None,
        }
    }

    /// Returns the changed property. Extent changes have none.
    pub fn property(&self) -> Option<PropertyId> {
        match self {
            ChangeEvent::Inserted { property, .. }
            | ChangeEvent::Deleted { property, .. }
            | ChangeEvent::Replaced { property, .. }
            | ChangeEvent::Modified { property, .. } => Some(*property),
            ChangeEvent::ExtentChanged { .. } => None,
        }
    }

    /// Returns the first index of the edited range, for vector edits.
    pub fn range_start(&self) -> Option<usize> {
        match self {
            ChangeEvent::Inserted { index, .. }
            | ChangeEvent::Deleted { index, .. }
            | ChangeEvent::Replaced { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Returns the ids that were inserted.
    pub fn inserted_ids(&self) -> &[ObjectId] {
        match self {
            ChangeEvent::Inserted { ids, .. } => ids,
            ChangeEvent::Replaced { inserted, .. } | ChangeEvent::ExtentChanged { inserted, .. } => {
                inserted
            }
            _ => &[],
        }
    }

    /// Returns the ids that were removed.
    pub fn deleted_ids(&self) -> &[ObjectId] {
        match self {
            ChangeEvent::Deleted { ids, .. } => ids,
            ChangeEvent::Replaced { deleted, .. } | ChangeEvent::ExtentChanged { deleted, .. } => {
                deleted
            }
            _ => &[],
        }
    }

    /// Returns the number of inserted ids.
    #[inline]
    pub fn inserted_count(&self) -> usize {
        self.inserted_ids().len()
    }

    /// Returns the number of removed ids.
    #[inline]
    pub fn deleted_count(&self) -> usize {
        self.deleted_ids().len()
    }

    /// Returns true if this event edits `(owner, property)`.
    pub fn touches(&self, owner: ObjectId, property: PropertyId) -> bool {
        self.owner() == Some(owner) && self.property() == Some(property)
    }
}
