//! In-memory object store.
//!
//! `ObjectStore` holds objects with string fields and vector properties.
//! Objects are owned by a slot in another object's vector (or are top
//! level); deleting an object deletes everything it owns and drops every
//! reference to the removed ids. Mutations made inside a task are journaled
//! and can be rolled back or undone; every mutation reports the
//! `ChangeEvent`s describing it so the caller can dispatch them.

use crate::journal::{Journal, JournalEntry, Slot};
use crate::object::{ObjectRecord, Ownership};
use crate::transaction::{Transaction, TransactionId, UndoStack};
use folio_core::{
    BackingStore, ChangeEvent, ClassId, DeleteConsequences, DeletePolicy, EditableStore, Error,
    ObjectId, ObjectResolver, PropertyId, Result,
};
use hashbrown::{HashMap, HashSet};
use std::collections::BTreeMap;
use tracing::debug;

/// Property reported in `ChangeEvent::Modified` for string-field edits.
pub const FIELD_PROPERTY: PropertyId = PropertyId::MAX;

/// In-memory backing store.
pub struct ObjectStore {
    objects: HashMap<ObjectId, ObjectRecord>,
    next_id: ObjectId,
    next_tx: TransactionId,
    session_classes: HashSet<ClassId>,
    protected: HashMap<ObjectId, String>,
    task: Option<Transaction>,
    undo: UndoStack,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            next_id: 1,
            next_tx: 1,
            session_classes: HashSet::new(),
            protected: HashMap::new(),
            task: None,
            undo: UndoStack::default(),
        }
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns a record.
    pub fn get(&self, id: ObjectId) -> Option<&ObjectRecord> {
        self.objects.get(&id)
    }

    fn alloc_id(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn journal(&mut self, entry: JournalEntry) -> Result<()> {
        match self.task.as_mut() {
            Some(task) => task.record(entry),
            None => Ok(()),
        }
    }

    /// Loads a top-level object, as when opening an existing project. Loaded
    /// objects do not count as created in this session.
    pub fn load(&mut self, class: ClassId, fields: &[(&str, &str)]) -> ObjectId {
        let id = self.alloc_id();
        let mut record = ObjectRecord::new(id, class, None);
        for (name, value) in fields {
            record.set_field(name, *value);
        }
        self.objects.insert(id, record);
        id
    }

    /// Loads an object owned by `(owner, property)`, appended at the end.
    pub fn load_owned(
        &mut self,
        owner: ObjectId,
        property: PropertyId,
        class: ClassId,
        fields: &[(&str, &str)],
    ) -> Result<ObjectId> {
        if !self.objects.contains_key(&owner) {
            return Err(Error::not_found(owner));
        }
        let id = self.alloc_id();
        let mut record = ObjectRecord::new(id, class, Some(Ownership { owner, property }));
        for (name, value) in fields {
            record.set_field(name, *value);
        }
        self.objects.insert(id, record);
        if let Some(owner_record) = self.objects.get_mut(&owner) {
            owner_record.vector_mut(property).push(id);
        }
        Ok(id)
    }

    /// Creates an object owned by `(owner, property)` at `index` (appended
    /// when `None` or past the end).
    pub fn create_owned(
        &mut self,
        owner: ObjectId,
        property: PropertyId,
        index: Option<usize>,
        class: ClassId,
        fields: &[(&str, &str)],
    ) -> Result<(ObjectId, Vec<ChangeEvent>)> {
        if !self.objects.contains_key(&owner) {
            return Err(Error::not_found(owner));
        }
        let id = self.alloc_id();
        let mut record = ObjectRecord::new(id, class, Some(Ownership { owner, property }));
        for (name, value) in fields {
            record.set_field(name, *value);
        }
        self.objects.insert(id, record);

        let slot_vec = self
            .objects
            .get_mut(&owner)
            .ok_or_else(|| Error::not_found(owner))?
            .vector_mut(property);
        let index = index.unwrap_or(slot_vec.len()).min(slot_vec.len());
        slot_vec.insert(index, id);
        self.session_classes.insert(class);

        self.journal(JournalEntry::Created {
            id,
            slot: Slot {
                owner,
                property,
                index,
            },
        })?;
        debug!(id, owner, property, index, "created object");

        Ok((
            id,
            vec![
                ChangeEvent::inserted(owner, property, index, id),
                ChangeEvent::ExtentChanged {
                    class,
                    inserted: vec![id],
                    deleted: Vec::new(),
                },
            ],
        ))
    }

    /// Sets a string field.
    pub fn set_field(&mut self, id: ObjectId, name: &str, value: &str) -> Result<ChangeEvent> {
        let record = self.objects.get_mut(&id).ok_or_else(|| Error::not_found(id))?;
        let old = record.set_field(name, value);
        self.journal(JournalEntry::FieldSet {
            id,
            name: name.to_owned(),
            old,
        })?;
        Ok(ChangeEvent::Modified {
            object: id,
            property: FIELD_PROPERTY,
        })
    }

    /// Inserts a non-owning reference to `target` into `(owner, property)`.
    pub fn add_reference(
        &mut self,
        owner: ObjectId,
        property: PropertyId,
        index: Option<usize>,
        target: ObjectId,
    ) -> Result<ChangeEvent> {
        if !self.objects.contains_key(&target) {
            return Err(Error::not_found(target));
        }
        let slot_vec = self
            .objects
            .get_mut(&owner)
            .ok_or_else(|| Error::not_found(owner))?
            .vector_mut(property);
        let index = index.unwrap_or(slot_vec.len()).min(slot_vec.len());
        slot_vec.insert(index, target);
        self.journal(JournalEntry::ReferenceAdded {
            slot: Slot {
                owner,
                property,
                index,
            },
            target,
        })?;
        Ok(ChangeEvent::inserted(owner, property, index, target))
    }

    /// Marks an object as not deletable.
    pub fn protect(&mut self, id: ObjectId, reason: impl Into<String>) {
        self.protected.insert(id, reason.into());
    }

    /// Returns `id` and every object it owns, transitively, root first.
    fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = vec![id];
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            cursor += 1;
            let Some(record) = self.objects.get(&current) else {
                continue;
            };
            for (property, ids) in record.vectors() {
                let owned_here = Some(Ownership {
                    owner: current,
                    property,
                });
                out.extend(ids.iter().copied().filter(|child| {
                    self.objects.get(child).and_then(ObjectRecord::owner) == owned_here
                }));
            }
        }
        out
    }

    /// Reference slots in surviving objects that point into `doomed`,
    /// excluding owning slots. Within each vector, highest index first.
    fn incoming(&self, doomed: &HashSet<ObjectId>) -> Vec<(Slot, ObjectId)> {
        let mut owners: Vec<_> = self
            .objects
            .keys()
            .copied()
            .filter(|id| !doomed.contains(id))
            .collect();
        owners.sort_unstable();

        let mut slots = Vec::new();
        for owner in owners {
            let Some(record) = self.objects.get(&owner) else {
                continue;
            };
            for (property, ids) in record.vectors() {
                for (index, target) in ids.iter().enumerate().rev() {
                    if !doomed.contains(target) {
                        continue;
                    }
                    let owning = self.objects.get(target).and_then(ObjectRecord::owner)
                        == Some(Ownership { owner, property });
                    if !owning {
                        slots.push((
                            Slot {
                                owner,
                                property,
                                index,
                            },
                            *target,
                        ));
                    }
                }
            }
        }
        slots
    }

    /// Deletes an object, everything it owns, and every reference to them.
    pub fn delete(&mut self, id: ObjectId) -> Result<Vec<ChangeEvent>> {
        if !self.objects.contains_key(&id) {
            return Err(Error::not_found(id));
        }
        let subtree = self.subtree(id);
        let doomed: HashSet<ObjectId> = subtree.iter().copied().collect();
        let mut events = Vec::new();

        let slot = match self.objects.get(&id).and_then(ObjectRecord::owner) {
            Some(Ownership { owner, property }) => {
                let owner_vec = self
                    .objects
                    .get_mut(&owner)
                    .map(|r| r.vector_mut(property));
                match owner_vec.and_then(|v| v.iter().position(|x| *x == id).map(|i| (v, i))) {
                    Some((v, index)) => {
                        v.remove(index);
                        events.push(ChangeEvent::deleted(owner, property, index, id));
                        Some(Slot {
                            owner,
                            property,
                            index,
                        })
                    }
                    None => None,
                }
            }
            None => None,
        };

        let references = self.incoming(&doomed);
        for (slot, target) in &references {
            if let Some(record) = self.objects.get_mut(&slot.owner) {
                record.vector_mut(slot.property).remove(slot.index);
                events.push(ChangeEvent::deleted(slot.owner, slot.property, slot.index, *target));
            }
        }

        let mut records = Vec::with_capacity(subtree.len());
        let mut by_class: BTreeMap<ClassId, Vec<ObjectId>> = BTreeMap::new();
        for doomed_id in &subtree {
            if let Some(record) = self.objects.remove(doomed_id) {
                by_class.entry(record.class()).or_default().push(*doomed_id);
                records.push(record);
            }
        }
        events.extend(by_class.into_iter().map(|(class, deleted)| ChangeEvent::ExtentChanged {
            class,
            inserted: Vec::new(),
            deleted,
        }));

        self.journal(JournalEntry::Deleted {
            id,
            records,
            slot,
            references,
        })?;
        debug!(id, removed = subtree.len(), "deleted object");
        Ok(events)
    }

    /// Returns true if there is a committed task to undo.
    pub fn can_undo(&self) -> bool {
        self.task.is_none() && !self.undo.is_empty()
    }

    /// Label of the task `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.peek_label()
    }

    /// Reverts the most recent committed task.
    pub fn undo(&mut self) -> Result<Vec<ChangeEvent>> {
        if self.task.is_some() {
            return Err(Error::invalid_operation("cannot undo while a task is open"));
        }
        let task = self
            .undo
            .pop()
            .ok_or_else(|| Error::invalid_operation("nothing to undo"))?;
        debug!(label = task.label(), "undoing task");
        Ok(self.revert(task.into_journal()))
    }

    fn revert(&mut self, mut journal: Journal) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for entry in journal.drain_reversed() {
            match entry {
                JournalEntry::Created { id, slot } => {
                    if let Some(record) = self.objects.get_mut(&slot.owner) {
                        let v = record.vector_mut(slot.property);
                        if let Some(index) = v.iter().position(|x| *x == id) {
                            v.remove(index);
                            events.push(ChangeEvent::deleted(slot.owner, slot.property, index, id));
                        }
                    }
                    if let Some(record) = self.objects.remove(&id) {
                        events.push(ChangeEvent::ExtentChanged {
                            class: record.class(),
                            inserted: Vec::new(),
                            deleted: vec![id],
                        });
                    }
                }
                JournalEntry::Deleted {
                    id,
                    records,
                    slot,
                    references,
                } => {
                    let mut by_class: BTreeMap<ClassId, Vec<ObjectId>> = BTreeMap::new();
                    for record in records {
                        by_class.entry(record.class()).or_default().push(record.id());
                        self.objects.insert(record.id(), record);
                    }
                    if let Some(slot) = slot {
                        if let Some(record) = self.objects.get_mut(&slot.owner) {
                            let v = record.vector_mut(slot.property);
                            let index = slot.index.min(v.len());
                            v.insert(index, id);
                            events.push(ChangeEvent::inserted(slot.owner, slot.property, index, id));
                        }
                    }
                    for (slot, target) in references.into_iter().rev() {
                        if let Some(record) = self.objects.get_mut(&slot.owner) {
                            let v = record.vector_mut(slot.property);
                            let index = slot.index.min(v.len());
                            v.insert(index, target);
                            events.push(ChangeEvent::inserted(slot.owner, slot.property, index, target));
                        }
                    }
                    events.extend(by_class.into_iter().map(|(class, inserted)| {
                        ChangeEvent::ExtentChanged {
                            class,
                            inserted,
                            deleted: Vec::new(),
                        }
                    }));
                }
                JournalEntry::FieldSet { id, name, old } => {
                    if let Some(record) = self.objects.get_mut(&id) {
                        match old {
                            Some(value) => {
                                record.set_field(&name, value);
                            }
                            None => {
                                record.clear_field(&name);
                            }
                        }
                        events.push(ChangeEvent::Modified {
                            object: id,
                            property: FIELD_PROPERTY,
                        });
                    }
                }
                JournalEntry::ReferenceAdded { slot, target } => {
                    if let Some(record) = self.objects.get_mut(&slot.owner) {
                        let v = record.vector_mut(slot.property);
                        if v.get(slot.index) == Some(&target) {
                            v.remove(slot.index);
                            events.push(ChangeEvent::deleted(slot.owner, slot.property, slot.index, target));
                        }
                    }
                }
            }
        }
        events
    }
}

impl ObjectResolver for ObjectStore {
    fn is_valid(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }
}

impl BackingStore for ObjectStore {
    fn vector(&self, owner: ObjectId, property: PropertyId) -> &[ObjectId] {
        self.objects
            .get(&owner)
            .map(|r| r.vector(property))
            .unwrap_or(&[])
    }

    fn class_of(&self, id: ObjectId) -> Option<ClassId> {
        self.objects.get(&id).map(ObjectRecord::class)
    }

    fn field(&self, id: ObjectId, name: &str) -> Option<&str> {
        self.objects.get(&id).and_then(|r| r.field(name))
    }

    fn instances_of(&self, class: ClassId) -> Vec<ObjectId> {
        let mut ids: Vec<_> = self
            .objects
            .values()
            .filter(|r| r.class() == class)
            .map(ObjectRecord::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn created_in_session(&self, class: ClassId) -> bool {
        self.session_classes.contains(&class)
    }
}

impl EditableStore for ObjectStore {
    fn delete_policy(&self, id: ObjectId) -> DeletePolicy {
        if !self.objects.contains_key(&id) {
            return DeletePolicy::Refused(format!("object {id} no longer exists"));
        }
        match self.protected.get(&id) {
            Some(reason) => DeletePolicy::Refused(reason.clone()),
            None => DeletePolicy::Allowed,
        }
    }

    fn delete_consequences(&self, id: ObjectId) -> Result<DeleteConsequences> {
        if !self.objects.contains_key(&id) {
            return Err(Error::not_found(id));
        }
        let subtree = self.subtree(id);
        let doomed: HashSet<ObjectId> = subtree.iter().copied().collect();
        Ok(DeleteConsequences {
            id,
            owned_descendants: subtree.len() - 1,
            incoming_references: self.incoming(&doomed).len(),
        })
    }

    fn begin_task(&mut self, label: &str) -> Result<()> {
        if self.task.is_some() {
            return Err(Error::invalid_operation("a task is already open"));
        }
        let id = self.next_tx;
        self.next_tx += 1;
        self.task = Some(Transaction::begin(id, label));
        Ok(())
    }

    fn delete_object(&mut self, id: ObjectId) -> Result<Vec<ChangeEvent>> {
        self.delete(id)
    }

    fn create_object(
        &mut self,
        owner: ObjectId,
        property: PropertyId,
        class: ClassId,
    ) -> Result<(ObjectId, Vec<ChangeEvent>)> {
        self.create_owned(owner, property, None, class, &[])
    }

    fn commit_task(&mut self) -> Result<()> {
        let task = self.task.take().ok_or(Error::TransactionClosed)?;
        self.undo.push(task.commit()?);
        Ok(())
    }

    fn rollback_task(&mut self) -> Result<Vec<ChangeEvent>> {
        let task = self.task.take().ok_or(Error::TransactionClosed)?;
        let journal = task.rollback()?;
        Ok(self.revert(journal))
    }
}
