//! Observable record lists.
//!
//! `ObservableList` wraps a [`MaterializedList`] and tells subscribers what
//! changed after every operation: a new snapshot, a new selection, a new
//! filter or sorter, or a warning. Events are derived by comparing against
//! the last published state, so an operation that changes nothing fires
//! nothing.

use crate::event::ListEvent;
use crate::subscription::{EventKind, SubscriptionId, SubscriptionManager};
use folio_algebra::{Filter, Schema, Sorter};
use folio_core::{BackingStore, ChangeEvent, EditableStore, ObjectId, Result, SortItem};
use folio_list::{
    ConfirmHost, DeleteOutcome, Dispatch, InsertOutcome, InsertStrategy, ListSettings,
    MaterializedList, Navigation, RecordDisplay, Snapshot, Warning,
};
use tracing::trace;

/// A record list that notifies subscribers of its changes.
pub struct ObservableList {
    list: MaterializedList,
    subscriptions: SubscriptionManager,
    published: Snapshot,
    selection: Option<ObjectId>,
}

impl ObservableList {
    /// Wraps `list`. Its current state counts as already published.
    pub fn new(list: MaterializedList) -> Self {
        let published = list.snapshot().clone();
        let selection = list.current_object();
        Self {
            list,
            subscriptions: SubscriptionManager::new(),
            published,
            selection,
        }
    }

    /// The wrapped list.
    #[inline]
    pub fn list(&self) -> &MaterializedList {
        &self.list
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.list.name()
    }

    /// Subscribes to every event.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ListEvent) + 'static,
    {
        self.subscriptions.subscribe(callback)
    }

    /// Subscribes to events of one kind.
    pub fn subscribe_to<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&ListEvent) + 'static,
    {
        self.subscriptions.subscribe_to(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// The last snapshot subscribers were told about.
    #[inline]
    pub fn published(&self) -> &Snapshot {
        &self.published
    }

    /// Runs `f` against the wrapped list and publishes whatever it changed.
    pub fn update<T>(&mut self, f: impl FnOnce(&mut MaterializedList) -> T) -> T {
        let value = f(&mut self.list);
        self.publish();
        value
    }

    /// Fires `RecordsChanged` if the list committed since the last
    /// publication and `SelectionChanged` if another object became current.
    pub fn publish(&mut self) {
        let snapshot = self.list.snapshot();
        if snapshot.generation != self.published.generation {
            let snapshot = snapshot.clone();
            trace!(list = %self.list.name(), generation = snapshot.generation, "publishing records");
            let event = ListEvent::records_changed(&self.published, snapshot.clone());
            self.published = snapshot;
            self.subscriptions.notify_all(&event);
        }

        let selection = self.list.current_object();
        if selection != self.selection {
            self.selection = selection;
            self.subscriptions.notify_all(&ListEvent::SelectionChanged {
                index: self.list.current_index(),
                object: selection,
            });
        }
    }

    fn warn(&self, warning: Warning) {
        self.subscriptions.notify_all(&ListEvent::Warning(warning));
    }

    // Lifecycle

    pub fn activate(&mut self, store: &dyn BackingStore) {
        self.update(|list| list.activate(store));
    }

    pub fn deactivate(&mut self, store: &dyn BackingStore) {
        self.update(|list| list.deactivate(store));
    }

    pub fn reload(&mut self, store: &dyn BackingStore) -> Dispatch {
        self.update(|list| list.reload(store))
    }

    pub fn set_suppressed(&mut self, store: &dyn BackingStore, suppressed: bool) {
        self.update(|list| list.set_suppressed(store, suppressed));
    }

    pub fn begin_broadcasting_changes(&mut self, expected: usize) {
        self.list.begin_broadcasting_changes(expected);
    }

    pub fn end_broadcasting_changes(&mut self, store: &dyn BackingStore) {
        self.update(|list| list.end_broadcasting_changes(store));
    }

    // Change notifications

    pub fn handle_event(&mut self, event: &ChangeEvent, store: &dyn BackingStore) -> Dispatch {
        self.update(|list| list.handle_event(event, store))
    }

    pub fn handle_events(&mut self, events: &[ChangeEvent], store: &dyn BackingStore) {
        self.update(|list| list.handle_events(events, store));
    }

    /// Repairs the selection after a foreign deletion, publishing the
    /// warning if a repair happened.
    pub fn ensure_current_valid(&mut self, store: &dyn BackingStore) -> Option<Warning> {
        let warning = self.update(|list| list.ensure_current_valid(store));
        if let Some(warning) = &warning {
            self.warn(warning.clone());
        }
        warning
    }

    // Filter and sorter

    pub fn add_filter(&mut self, filter: Filter, store: &dyn BackingStore) {
        self.update(|list| list.add_filter(filter, store));
        self.filter_changed();
    }

    pub fn remove_filter(&mut self, filter: &Filter, store: &dyn BackingStore) {
        self.update(|list| list.remove_filter(filter, store));
        self.filter_changed();
    }

    pub fn set_filter(&mut self, filter: Filter, store: &dyn BackingStore) {
        self.update(|list| list.set_filter(filter, store));
        self.filter_changed();
    }

    fn filter_changed(&self) {
        self.subscriptions.notify_all(&ListEvent::FilterChanged {
            description: self.list.filter_status(),
        });
    }

    pub fn set_sorter(
        &mut self,
        sorter: Option<Box<dyn Sorter>>,
        name: Option<String>,
        store: &dyn BackingStore,
    ) {
        self.update(|list| list.set_sorter(sorter, name, store));
        self.sorter_changed();
    }

    fn sorter_changed(&self) {
        self.subscriptions.notify_all(&ListEvent::SorterChanged {
            name: self.list.sorter_name().map(str::to_owned),
        });
    }

    pub fn settings(&self) -> Result<ListSettings> {
        self.list.settings()
    }

    /// Restores saved settings. Every reset component is also published as
    /// a warning.
    pub fn restore_settings(
        &mut self,
        settings: &ListSettings,
        schema: &Schema,
        store: &dyn BackingStore,
    ) -> Vec<Warning> {
        let warnings = self.update(|list| list.restore_settings(settings, schema, store));
        self.filter_changed();
        self.sorter_changed();
        for warning in &warnings {
            self.warn(warning.clone());
        }
        warnings
    }

    // Workflows

    pub fn delete_current<S: EditableStore>(
        &mut self,
        store: &mut S,
        host: &mut dyn ConfirmHost,
    ) -> Result<DeleteOutcome> {
        self.update(|list| list.delete_current(store, host))
    }

    pub fn delete_record<S: EditableStore>(
        &mut self,
        id: ObjectId,
        store: &mut S,
        host: &mut dyn ConfirmHost,
    ) -> Result<DeleteOutcome> {
        self.update(|list| list.delete_record(id, store, host))
    }

    pub fn insert_record<S: EditableStore>(
        &mut self,
        store: &mut S,
        strategy: &InsertStrategy,
    ) -> Result<InsertOutcome> {
        self.update(|list| list.insert_record(store, strategy))
    }

    // Selection

    pub fn current_object(&self) -> Option<ObjectId> {
        self.list.current_object()
    }

    pub fn jump_to_object(&mut self, id: ObjectId) -> bool {
        self.update(|list| list.jump_to_object(id))
    }

    pub fn jump_to_index(&mut self, index: usize) -> bool {
        self.update(|list| list.jump_to_index(index))
    }
}

impl Navigation for ObservableList {
    fn current_index(&self) -> Option<usize> {
        self.list.current_index()
    }

    fn set_current_index(&mut self, index: Option<usize>) {
        self.update(|list| list.set_current_index(index));
    }

    fn row_count(&self) -> usize {
        self.list.len()
    }
}

impl RecordDisplay for ObservableList {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn item(&self, index: usize) -> Option<SortItem> {
        self.list.item(index).cloned()
    }

    fn snapshot(&self) -> Snapshot {
        self.published.clone()
    }
}
