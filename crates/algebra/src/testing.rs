//! In-memory fake store for unit tests.

use folio_core::{BackingStore, ClassId, ObjectId, ObjectResolver, PropertyId};
use hashbrown::HashMap;

#[derive(Default)]
pub(crate) struct FakeStore {
    objects: HashMap<ObjectId, (ClassId, HashMap<String, String>)>,
    vectors: HashMap<(ObjectId, PropertyId), Vec<ObjectId>>,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_object(mut self, id: ObjectId, class: ClassId, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        self.objects.insert(id, (class, fields));
        self
    }

    pub(crate) fn with_vector(mut self, owner: ObjectId, property: PropertyId, ids: &[ObjectId]) -> Self {
        self.vectors.insert((owner, property), ids.to_vec());
        self
    }
}

impl ObjectResolver for FakeStore {
    fn is_valid(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }
}

impl BackingStore for FakeStore {
    fn vector(&self, owner: ObjectId, property: PropertyId) -> &[ObjectId] {
        self.vectors
            .get(&(owner, property))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn class_of(&self, id: ObjectId) -> Option<ClassId> {
        self.objects.get(&id).map(|(class, _)| *class)
    }

    fn field(&self, id: ObjectId, name: &str) -> Option<&str> {
        self.objects
            .get(&id)
            .and_then(|(_, fields)| fields.get(name))
            .map(String::as_str)
    }

    fn instances_of(&self, class: ClassId) -> Vec<ObjectId> {
        let mut ids: Vec<_> = self
            .objects
            .iter()
            .filter(|(_, (c, _))| *c == class)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn created_in_session(&self, _class: ClassId) -> bool {
        false
    }
}
