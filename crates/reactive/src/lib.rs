//! Folio Reactive - Observable record lists for Folio.
//!
//! This crate lets UI code subscribe to record lists. When the backing store
//! changes, the registry routes the change events to every live list, and
//! each list tells its subscribers what it republished.
//!
//! # Core Concepts
//!
//! - `ListEvent`: records, selection, filter, sorter or warning changes
//! - `ObservableList`: a `MaterializedList` that notifies subscribers
//! - `SubscriptionManager`: manages subscriptions to list events
//! - `ListRegistry`: routes store changes to the lists of a session
//!
//! # Example
//!
//! ```rust
//! use folio_list::{ListConfig, MaterializedList, VectorSource};
//! use folio_reactive::{ListEvent, ListRegistry, ObservableList};
//! use folio_storage::ObjectStore;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut store = ObjectStore::new();
//! let lexicon = store.load(1, &[]);
//! let entry = store.load_owned(lexicon, 10, 2, &[("Form", "apple")]).unwrap();
//!
//! let mut registry = ListRegistry::new();
//! let list = MaterializedList::new(
//!     ListConfig::new("entries").with_primary(false),
//!     VectorSource::new(lexicon, 10),
//! )
//! .unwrap();
//! let list = Rc::new(RefCell::new(ObservableList::new(list)));
//! registry.register(&list);
//!
//! let removed = Rc::new(RefCell::new(Vec::new()));
//! let sink = removed.clone();
//! list.borrow_mut().subscribe(move |event| {
//!     if let ListEvent::RecordsChanged { removed, .. } = event {
//!         sink.borrow_mut().extend(removed.iter().copied());
//!     }
//! });
//! list.borrow_mut().activate(&store);
//!
//! let events = store.delete(entry).unwrap();
//! registry.dispatch(&events, &store);
//! assert_eq!(*removed.borrow(), vec![entry]);
//! ```

pub mod event;
pub mod notify;
pub mod observable;
pub mod subscription;

pub use event::ListEvent;
pub use notify::{ListId, ListRegistry};
pub use observable::ObservableList;
pub use subscription::{EventCallback, EventKind, Subscription, SubscriptionId, SubscriptionManager};
