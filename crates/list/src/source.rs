//! Object-set providers: where a list's candidate ids come from.

use folio_core::{BackingStore, ChangeEvent, ClassId, ObjectId, PropertyId};

/// Supplies the candidate backing ids of a list.
pub trait ObjectSource {
    /// Enumerates the candidate ids, in source order.
    fn candidates(&self, store: &dyn BackingStore) -> Vec<ObjectId>;

    /// Returns true if `event` changes the tracked membership.
    fn tracks(&self, event: &ChangeEvent) -> bool;

    /// The owning object, for sources projecting a vector property.
    fn owner(&self) -> Option<ObjectId> {
        None
    }

    /// The projected vector property.
    fn property(&self) -> Option<PropertyId> {
        None
    }

    /// Returns true if `candidates` is already in display order.
    fn in_final_order(&self) -> bool {
        false
    }
}

/// The ids held by one vector property of one owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorSource {
    owner: ObjectId,
    property: PropertyId,
}

impl VectorSource {
    pub fn new(owner: ObjectId, property: PropertyId) -> Self {
        Self { owner, property }
    }
}

impl ObjectSource for VectorSource {
    fn candidates(&self, store: &dyn BackingStore) -> Vec<ObjectId> {
        store.vector(self.owner, self.property).to_vec()
    }

    fn tracks(&self, event: &ChangeEvent) -> bool {
        event.touches(self.owner, self.property)
    }

    fn owner(&self) -> Option<ObjectId> {
        Some(self.owner)
    }

    fn property(&self) -> Option<PropertyId> {
        Some(self.property)
    }
}

/// Every live instance of a class, in id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassExtentSource {
    class: ClassId,
}

impl ClassExtentSource {
    pub fn new(class: ClassId) -> Self {
        Self { class }
    }
}

impl ObjectSource for ClassExtentSource {
    fn candidates(&self, store: &dyn BackingStore) -> Vec<ObjectId> {
        store.instances_of(self.class)
    }

    fn tracks(&self, event: &ChangeEvent) -> bool {
        matches!(event, ChangeEvent::ExtentChanged { class, .. } if *class == self.class)
    }
}
