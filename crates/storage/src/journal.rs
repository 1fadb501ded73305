//! Journal for tracking object-store mutations.
//!
//! Every mutation made inside a task is recorded here with enough state to
//! undo it. Entries are reverted newest first.

use crate::object::ObjectRecord;
use folio_core::{ObjectId, PropertyId};

/// The vector slot an id occupied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub owner: ObjectId,
    pub property: PropertyId,
    pub index: usize,
}

/// A single journal entry representing a change.
#[derive(Clone, Debug)]
pub enum JournalEntry {
    /// An object was created in `slot`.
    Created { id: ObjectId, slot: Slot },
    /// An object and its owned subtree were deleted.
    Deleted {
        id: ObjectId,
        /// Snapshot of every removed record, root first.
        records: Vec<ObjectRecord>,
        /// The owning slot of the root, if it had one.
        slot: Option<Slot>,
        /// Reference slots that pointed into the subtree, in removal order.
        references: Vec<(Slot, ObjectId)>,
    },
    /// A string field was set.
    FieldSet {
        id: ObjectId,
        name: String,
        old: Option<String>,
    },
    /// A reference was inserted into a vector.
    ReferenceAdded { slot: Slot, target: ObjectId },
}

impl JournalEntry {
    /// Returns the object the entry is about.
    pub fn object_id(&self) -> ObjectId {
        match self {
            JournalEntry::Created { id, .. }
            | JournalEntry::Deleted { id, .. }
            | JournalEntry::FieldSet { id, .. } => *id,
            JournalEntry::ReferenceAdded { target, .. } => *target,
        }
    }
}

/// Ordered record of the changes made by one task.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    #[inline]
    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Returns all journal entries in recording order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Takes the entries, newest first, for reverting.
    pub fn drain_reversed(&mut self) -> impl Iterator<Item = JournalEntry> {
        let mut entries = core::mem::take(&mut self.entries);
        entries.reverse();
        entries.into_iter()
    }

    /// Takes the entries in recording order.
    pub fn take(&mut self) -> Vec<JournalEntry> {
        core::mem::take(&mut self.entries)
    }
}
