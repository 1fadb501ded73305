//! Routing of backing-store notifications to reload decisions.

use super::MaterializedList;
use folio_core::{BackingStore, ChangeEvent, ObjectId};
use tracing::trace;

/// How a notification was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A single insertion was spliced in.
    Patched,
    /// The rows were rebuilt.
    Reloaded,
    /// The list is suppressed; the reload happens when suppression lifts.
    Deferred,
    /// The notification does not affect the list.
    Ignored,
}

impl MaterializedList {
    /// Handles one change notification:
    ///
    /// 1. a change of the tracked property is patched or reloaded;
    /// 2. a change of a watched aggregate reloads;
    /// 3. a deletion of the current row's key or of any id on its path
    ///    reloads, since the root alone cannot reveal it;
    /// 4. anything else is ignored.
    pub fn handle_event(&mut self, event: &ChangeEvent, store: &dyn BackingStore) -> Dispatch {
        if self.source.tracks(event) {
            let inserted = event.inserted_count();
            let deleted = event.deleted_count();
            return match event.range_start() {
                Some(start) => self.reload_range(store, start, inserted, deleted),
                None => self.reload(store),
            };
        }
        if self.watches(event) {
            return self.reload(store);
        }
        if self.current_depends_on_any(event.deleted_ids()) {
            return self.reload(store);
        }
        trace!(list = %self.config.name, ?event, "ignored");
        Dispatch::Ignored
    }

    /// Handles notifications in arrival order.
    pub fn handle_events(&mut self, events: &[ChangeEvent], store: &dyn BackingStore) {
        for event in events {
            self.handle_event(event, store);
        }
    }

    fn watches(&self, event: &ChangeEvent) -> bool {
        if let ChangeEvent::ExtentChanged { class, .. } = event {
            return self.config.extent_class == Some(*class);
        }
        event
            .property()
            .is_some_and(|property| self.config.watched_properties.contains(&property))
    }

    fn current_depends_on_any(&self, deleted: &[ObjectId]) -> bool {
        if deleted.is_empty() {
            return false;
        }
        self.current_item()
            .is_some_and(|item| deleted.iter().any(|&id| item.depends_on(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListConfig;
    use crate::source::VectorSource;
    use crate::testing::{fruit_store, schema, ENTRIES, ENTRY, SENSE, SENSES};
    use folio_algebra::{FanOut, FieldSorter, SortKey};
    use folio_core::SortItem;

    const RELATED: u32 = 30;

    #[test]
    fn test_dispatch_tracked_bulk_change_reloads() {
        let (store, lex, ids) = fruit_store(&["Apple", "Banana", "Cherry"]);
        let mut list = crate::testing::fruit_list(lex);
        list.reload(&store);
        let event = ChangeEvent::Replaced {
            owner: lex,
            property: ENTRIES,
            index: 0,
            inserted: vec![ids[0], ids[1]],
            deleted: vec![ids[0], ids[1]],
        };
        assert_eq!(list.handle_event(&event, &store), Dispatch::Reloaded);
    }

    #[test]
    fn test_dispatch_watched_property_and_extent() {
        let (store, lex, ids) = fruit_store(&["Apple", "Banana"]);
        let config = ListConfig::new("entries")
            .with_watched_property(RELATED)
            .with_extent_class(ENTRY);
        let mut list = super::MaterializedList::new(config, VectorSource::new(lex, ENTRIES)).unwrap();
        list.reload(&store);

        let watched = ChangeEvent::inserted(ids[0], RELATED, 0, ids[1]);
        assert_eq!(list.handle_event(&watched, &store), Dispatch::Reloaded);

        let extent = ChangeEvent::ExtentChanged {
            class: ENTRY,
            inserted: vec![99],
            deleted: Vec::new(),
        };
        assert_eq!(list.handle_event(&extent, &store), Dispatch::Reloaded);

        let other = ChangeEvent::inserted(ids[0], RELATED + 1, 0, ids[1]);
        assert_eq!(list.handle_event(&other, &store), Dispatch::Ignored);
    }

    #[test]
    fn test_dispatch_deleted_path_member_reloads() {
        let (mut store, lex, ids) = fruit_store(&["Apple", "Banana"]);
        let run = store.load_owned(ids[0], SENSES, SENSE, &[("Form", "a1")]).unwrap();
        let walk = store.load_owned(ids[0], SENSES, SENSE, &[("Form", "a2")]).unwrap();
        store.load_owned(ids[1], SENSES, SENSE, &[("Form", "b1")]).unwrap();

        let sorter = FieldSorter::new(vec![SortKey::asc("Form")], &schema())
            .unwrap()
            .with_fan_out(FanOut::new(vec![SENSES]));
        let mut list = super::MaterializedList::new(ListConfig::new("senses"), VectorSource::new(lex, ENTRIES))
            .unwrap()
            .with_sorter(sorter, "Sense");
        list.reload(&store);
        assert_eq!(list.len(), 3);
        assert_eq!(list.current_item(), Some(&SortItem::with_path(run, ids[0], vec![run])));

        // A sense that is not current is not noticed.
        let events = store.delete(walk).unwrap();
        assert_eq!(list.handle_event(&events[0], &store), Dispatch::Ignored);

        // Deleting the current row's key is.
        let events = store.delete(run).unwrap();
        assert_eq!(list.handle_event(&events[0], &store), Dispatch::Reloaded);
        assert_eq!(list.len(), 2);
        assert_eq!(list.current_root(), Some(ids[0]));
        assert_eq!(list.current_object(), Some(ids[0]));
    }

    #[test]
    fn test_dispatch_unrelated_change_ignored() {
        let (store, lex, ids) = fruit_store(&["Apple", "Banana"]);
        let mut list = crate::testing::fruit_list(lex);
        list.reload(&store);
        let generation = list.generation();
        let event = ChangeEvent::Modified {
            object: ids[0],
            property: 5,
        };
        assert_eq!(list.handle_event(&event, &store), Dispatch::Ignored);
        assert_eq!(list.generation(), generation);
    }
}
