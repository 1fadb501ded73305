//! Object records held by the in-memory store.

use folio_core::{ClassId, ObjectId, PropertyId};
use std::collections::BTreeMap;

/// Where an owned object lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ownership {
    pub owner: ObjectId,
    pub property: PropertyId,
}

/// A backing object: class, owner, string fields and vector properties.
#[derive(Clone, Debug)]
pub struct ObjectRecord {
    id: ObjectId,
    class: ClassId,
    owner: Option<Ownership>,
    fields: BTreeMap<String, String>,
    vectors: BTreeMap<PropertyId, Vec<ObjectId>>,
}

impl ObjectRecord {
    /// Creates a record with no fields and empty vectors.
    pub fn new(id: ObjectId, class: ClassId, owner: Option<Ownership>) -> Self {
        Self {
            id,
            class,
            owner,
            fields: BTreeMap::new(),
            vectors: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn owner(&self) -> Option<Ownership> {
        self.owner
    }

    /// Returns a field value.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Sets a field, returning the previous value.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.to_owned(), value.into())
    }

    /// Removes a field, returning the previous value.
    pub fn clear_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Returns a vector property; absent properties are empty.
    pub fn vector(&self, property: PropertyId) -> &[ObjectId] {
        self.vectors.get(&property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns a vector property for editing, creating it if absent.
    pub fn vector_mut(&mut self, property: PropertyId) -> &mut Vec<ObjectId> {
        self.vectors.entry(property).or_default()
    }

    /// Iterates over every vector property.
    pub fn vectors(&self) -> impl Iterator<Item = (PropertyId, &[ObjectId])> {
        self.vectors.iter().map(|(p, v)| (*p, v.as_slice()))
    }
}
