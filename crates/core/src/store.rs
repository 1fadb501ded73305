//! Backing-store contracts consumed by the record-list engine.
//!
//! The engine never owns domain objects. It reads vector properties, checks
//! liveness and reads display fields through [`BackingStore`]; record
//! workflows additionally mutate through [`EditableStore`].

use crate::error::Result;
use crate::event::ChangeEvent;
use crate::ids::{ClassId, ObjectId, PropertyId};

/// Liveness check for identifiers.
pub trait ObjectResolver {
    /// Returns true if `id` currently resolves to a live object.
    fn is_valid(&self, id: ObjectId) -> bool;
}

/// Read side of the backing store.
pub trait BackingStore: ObjectResolver {
    /// Returns the ordered ids held by `(owner, property)`. Missing owners or
    /// properties yield an empty slice.
    fn vector(&self, owner: ObjectId, property: PropertyId) -> &[ObjectId];

    /// Returns the class of a live object.
    fn class_of(&self, id: ObjectId) -> Option<ClassId>;

    /// Returns a string field of a live object.
    fn field(&self, id: ObjectId, name: &str) -> Option<&str>;

    /// Returns every live instance of `class`, in id order.
    fn instances_of(&self, class: ClassId) -> Vec<ObjectId>;

    /// Returns true if an instance of `class` was created since the store
    /// was opened in this process.
    fn created_in_session(&self, class: ClassId) -> bool;
}

/// Outcome of the deletion policy hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeletePolicy {
    /// The object may be deleted.
    Allowed,
    /// The object may not be deleted, with a reason for the user.
    Refused(String),
}

impl DeletePolicy {
    /// Returns true if deletion is allowed.
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, DeletePolicy::Allowed)
    }
}

/// What a deletion would take down with it, shown before confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteConsequences {
    /// The object to delete.
    pub id: ObjectId,
    /// Number of owned descendants removed along with it.
    pub owned_descendants: usize,
    /// Number of vector slots elsewhere that still reference it.
    pub incoming_references: usize,
}

/// Write side of the backing store, used by the record workflows.
///
/// Mutations happen inside a task opened with [`EditableStore::begin_task`];
/// committing a task makes it a single undoable unit.
pub trait EditableStore: BackingStore {
    /// Policy hook consulted before any deletion.
    fn delete_policy(&self, id: ObjectId) -> DeletePolicy;

    /// Describes what deleting `id` would remove.
    fn delete_consequences(&self, id: ObjectId) -> Result<DeleteConsequences>;

    /// Opens an undoable task.
    fn begin_task(&mut self, label: &str) -> Result<()>;

    /// Deletes an object and everything it owns.
    fn delete_object(&mut self, id: ObjectId) -> Result<Vec<ChangeEvent>>;

    /// Creates an object of `class` appended to `(owner, property)`.
    fn create_object(
        &mut self,
        owner: ObjectId,
        property: PropertyId,
        class: ClassId,
    ) -> Result<(ObjectId, Vec<ChangeEvent>)>;

    /// Commits the open task.
    fn commit_task(&mut self) -> Result<()>;

    /// Rolls the open task back, returning the events that describe the
    /// restoration.
    fn rollback_task(&mut self) -> Result<Vec<ChangeEvent>>;
}
