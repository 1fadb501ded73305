//! List registry and change routing.
//!
//! `ListRegistry` holds every live list of a session weakly and routes the
//! store's change events to them. A list that is busy when events arrive
//! (its `RefCell` is already borrowed, typically because the events were
//! raised from inside one of its own operations) is marked deferred and
//! rebuilt in full on the next dispatch instead.

use crate::observable::ObservableList;
use folio_core::{BackingStore, ChangeEvent, EditableStore, Error, Result};
use folio_list::{ConfirmHost, DeleteOutcome, FocusRegistry, InsertOutcome, InsertStrategy};
use hashbrown::HashSet;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Unique identifier for a registered list.
pub type ListId = u64;

/// Routes change events to the lists of one session.
///
/// # Example
///
/// ```ignore
/// let mut registry = ListRegistry::new();
/// let entries = Rc::new(RefCell::new(ObservableList::new(list)));
/// let id = registry.register(&entries);
///
/// let events = store.undo()?;
/// registry.dispatch(&events, &store);
/// ```
pub struct ListRegistry {
    lists: BTreeMap<ListId, Weak<RefCell<ObservableList>>>,
    /// Lists that missed a dispatch while busy
    deferred: HashSet<ListId>,
    focus: Rc<RefCell<FocusRegistry>>,
    next_id: ListId,
}

impl Default for ListRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListRegistry {
    pub fn new() -> Self {
        Self {
            lists: BTreeMap::new(),
            deferred: HashSet::new(),
            focus: Rc::new(RefCell::new(FocusRegistry::new())),
            next_id: 1,
        }
    }

    /// The focus registry lists of this session should report to.
    pub fn focus_registry(&self) -> Rc<RefCell<FocusRegistry>> {
        self.focus.clone()
    }

    /// Registers a list. The registry holds it weakly; dropping the last
    /// strong reference unregisters it at the next cleanup.
    pub fn register(&mut self, list: &Rc<RefCell<ObservableList>>) -> ListId {
        let id = self.next_id;
        self.next_id += 1;
        self.lists.insert(id, Rc::downgrade(list));
        id
    }

    /// Returns true if the list was found and removed.
    pub fn unregister(&mut self, id: ListId) -> bool {
        self.deferred.remove(&id);
        self.lists.remove(&id).is_some()
    }

    /// Returns a registered list that is still alive.
    pub fn list(&self, id: ListId) -> Option<Rc<RefCell<ObservableList>>> {
        self.lists.get(&id).and_then(Weak::upgrade)
    }

    /// Returns true if `id` missed a dispatch and will be rebuilt.
    pub fn is_deferred(&self, id: ListId) -> bool {
        self.deferred.contains(&id)
    }

    /// Delivers `events` to every live list.
    pub fn dispatch(&mut self, events: &[ChangeEvent], store: &dyn BackingStore) {
        self.dispatch_except(None, events, store);
    }

    /// Delivers `events` to every live list but `skip`.
    pub fn dispatch_except(
        &mut self,
        skip: Option<ListId>,
        events: &[ChangeEvent],
        store: &dyn BackingStore,
    ) {
        trace!(events = events.len(), lists = self.lists.len(), "dispatching changes");
        for (id, list) in self.live() {
            if Some(id) == skip {
                continue;
            }
            let Ok(mut list) = list.try_borrow_mut() else {
                debug!(list = id, "list busy, deferring rebuild");
                self.deferred.insert(id);
                continue;
            };
            if self.deferred.remove(&id) {
                debug!(list = %list.name(), "rebuilding deferred list");
                list.reload(store);
            } else {
                list.handle_events(events, store);
            }
        }
    }

    /// Rebuilds deferred lists that are no longer busy.
    pub fn flush_deferred(&mut self, store: &dyn BackingStore) {
        let pending: Vec<ListId> = self.deferred.iter().copied().collect();
        for id in pending {
            let Some(list) = self.list(id) else {
                self.deferred.remove(&id);
                continue;
            };
            if let Ok(mut list) = list.try_borrow_mut() {
                self.deferred.remove(&id);
                list.reload(store);
            };
        }
    }

    /// Announces `expected` upcoming notifications to every list.
    pub fn begin_broadcasting_changes(&mut self, expected: usize) {
        for (id, list) in self.live() {
            match list.try_borrow_mut() {
                Ok(mut list) => list.begin_broadcasting_changes(expected),
                Err(_) => debug!(list = id, "list busy at start of batch"),
            }
        }
    }

    /// Closes the batch opened by [`Self::begin_broadcasting_changes`].
    pub fn end_broadcasting_changes(&mut self, store: &dyn BackingStore) {
        for (id, list) in self.live() {
            match list.try_borrow_mut() {
                Ok(mut list) => list.end_broadcasting_changes(store),
                Err(_) => {
                    debug!(list = id, "list busy at end of batch, deferring rebuild");
                    self.deferred.insert(id);
                }
            }
        }
    }

    /// Deletes the current record of list `id` and forwards the resulting
    /// events to every other list.
    pub fn delete_current<S: EditableStore>(
        &mut self,
        id: ListId,
        store: &mut S,
        host: &mut dyn ConfirmHost,
    ) -> Result<DeleteOutcome> {
        let list = self.require(id)?;
        let outcome = list
            .try_borrow_mut()
            .map_err(|_| Error::invalid_operation(format!("list {id} is busy")))?
            .delete_current(store, host)?;
        if let DeleteOutcome::Deleted { events, .. } = &outcome {
            self.dispatch_except(Some(id), events, &*store);
        }
        Ok(outcome)
    }

    /// Inserts a record through list `id` and forwards the resulting events
    /// to every other list.
    pub fn insert_record<S: EditableStore>(
        &mut self,
        id: ListId,
        store: &mut S,
        strategy: &InsertStrategy,
    ) -> Result<InsertOutcome> {
        let list = self.require(id)?;
        let outcome = list
            .try_borrow_mut()
            .map_err(|_| Error::invalid_operation(format!("list {id} is busy")))?
            .insert_record(store, strategy)?;
        self.dispatch_except(Some(id), &outcome.events, &*store);
        Ok(outcome)
    }

    /// Drops entries whose list has been dropped.
    pub fn cleanup(&mut self) {
        self.lists.retain(|_, list| list.strong_count() > 0);
        let lists = &self.lists;
        self.deferred.retain(|id| lists.contains_key(id));
    }

    /// Number of registered lists, live or not yet cleaned up.
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn clear(&mut self) {
        self.lists.clear();
        self.deferred.clear();
    }

    fn require(&self, id: ListId) -> Result<Rc<RefCell<ObservableList>>> {
        self.list(id)
            .ok_or_else(|| Error::invalid_operation(format!("no live list registered as {id}")))
    }

    fn live(&self) -> Vec<(ListId, Rc<RefCell<ObservableList>>)> {
        self.lists
            .iter()
            .filter_map(|(id, list)| list.upgrade().map(|list| (*id, list)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_algebra::{FieldSorter, Schema, SortKey};
    use folio_core::{ClassId, ObjectId, PropertyId};
    use folio_list::{ListConfig, MaterializedList, RecordDisplay, VectorSource};
    use folio_storage::ObjectStore;

    const LEXICON: ClassId = 1;
    const ENTRY: ClassId = 2;
    const ENTRIES: PropertyId = 10;

    fn setup(forms: &[&str]) -> (ObjectStore, ObjectId, Vec<ObjectId>) {
        let mut store = ObjectStore::new();
        let lexicon = store.load(LEXICON, &[]);
        let ids = forms
            .iter()
            .map(|form| {
                store
                    .load_owned(lexicon, ENTRIES, ENTRY, &[("Form", *form)])
                    .unwrap()
            })
            .collect();
        (store, lexicon, ids)
    }

    fn shared_list(
        name: &str,
        lexicon: ObjectId,
        registry: &ListRegistry,
        store: &ObjectStore,
    ) -> Rc<RefCell<ObservableList>> {
        let schema = Schema::new().with_field("Form");
        let sorter = FieldSorter::new(vec![SortKey::asc("Form")], &schema).unwrap();
        let list = MaterializedList::new(
            ListConfig::new(name).with_primary(false),
            VectorSource::new(lexicon, ENTRIES),
        )
        .unwrap()
        .with_sorter(sorter, "Form")
        .with_focus_registry(registry.focus_registry());
        let list = Rc::new(RefCell::new(ObservableList::new(list)));
        list.borrow_mut().activate(store);
        list
    }

    #[test]
    fn test_registry_register_unregister() {
        let (store, lexicon, _) = setup(&["a"]);
        let mut registry = ListRegistry::new();
        let list = shared_list("one", lexicon, &registry, &store);

        let id = registry.register(&list);
        assert_eq!(registry.list_count(), 1);
        assert!(registry.list(id).is_some());
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_cleanup_dropped_lists() {
        let (store, lexicon, _) = setup(&["a"]);
        let mut registry = ListRegistry::new();
        let list = shared_list("one", lexicon, &registry, &store);
        let id = registry.register(&list);

        drop(list);
        assert!(registry.list(id).is_none());
        registry.cleanup();
        assert_eq!(registry.list_count(), 0);
    }

    #[test]
    fn test_registry_dispatch_reaches_every_list() {
        let (mut store, lexicon, ids) = setup(&["a", "b", "c"]);
        let mut registry = ListRegistry::new();
        let first = shared_list("first", lexicon, &registry, &store);
        let second = shared_list("second", lexicon, &registry, &store);
        registry.register(&first);
        registry.register(&second);

        store.begin_task("delete").unwrap();
        let events = store.delete(ids[1]).unwrap();
        store.commit_task().unwrap();
        registry.dispatch(&events, &store);

        for list in [&first, &second] {
            assert_eq!(&*list.borrow().snapshot().roots, &[ids[0], ids[2]]);
        }
    }

    #[test]
    fn test_registry_busy_list_is_deferred() {
        let (mut store, lexicon, ids) = setup(&["a", "b", "c"]);
        let mut registry = ListRegistry::new();
        let list = shared_list("busy", lexicon, &registry, &store);
        let id = registry.register(&list);

        store.begin_task("delete").unwrap();
        let events = store.delete(ids[2]).unwrap();
        store.commit_task().unwrap();

        {
            let _guard = list.borrow_mut();
            registry.dispatch(&events, &store);
        }
        assert!(registry.is_deferred(id));
        assert_eq!(list.borrow().len(), 3);

        registry.flush_deferred(&store);
        assert!(!registry.is_deferred(id));
        assert_eq!(&*list.borrow().snapshot().roots, &[ids[0], ids[1]]);
    }

    #[test]
    fn test_registry_unknown_list_errors() {
        let (mut store, _, _) = setup(&["a"]);
        let mut registry = ListRegistry::new();
        let mut host = |_: &folio_core::DeleteConsequences| true;
        assert!(registry.delete_current(42, &mut store, &mut host).is_err());
    }
}
