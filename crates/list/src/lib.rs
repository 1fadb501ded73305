//! Folio List - Materialized record-list engine.
//!
//! This crate projects a mutable, externally owned collection of backing
//! objects into an ordered, filtered, sorted sequence of rows and keeps that
//! projection in step with change notifications.
//!
//! # Core Concepts
//!
//! - `MaterializedList`: the engine. Full reloads, single-insertion
//!   patches, suppression and batching, a self-healing current index
//! - `ObjectSource`: where candidate ids come from (`VectorSource`,
//!   `ClassExtentSource`)
//! - `Snapshot`: the rows and current index as published by one commit
//! - `ListCache`: the single-use side file that seeds the next activation
//! - `FocusRegistry`: shared, reference-counted set of focused objects
//! - `Navigation` / `RecordDisplay` / `ConfirmHost`: narrow capabilities a
//!   consumer composes
//!
//! # Example
//!
//! ```rust
//! use folio_algebra::{FieldFilter, FieldSorter, Filter, Matcher, Schema, SortKey};
//! use folio_list::{ListConfig, MaterializedList, VectorSource};
//! use folio_storage::ObjectStore;
//!
//! let mut store = ObjectStore::new();
//! let lexicon = store.load(1, &[]);
//! for form in ["Cherry", "Apple", "Banana"] {
//!     store.load_owned(lexicon, 10, 2, &[("Form", form)]).unwrap();
//! }
//!
//! let schema = Schema::new().with_field("Form");
//! let sorter = FieldSorter::new(vec![SortKey::asc("Form")], &schema).unwrap();
//! let mut list = MaterializedList::new(ListConfig::new("entries"), VectorSource::new(lexicon, 10))
//!     .unwrap()
//!     .with_sorter(sorter, "Form")
//!     .with_filter(Filter::Field(FieldFilter::new("Form", Matcher::Contains("an".into()))));
//!
//! list.reload(&store);
//! assert_eq!(list.len(), 1);
//! assert_eq!(list.current_index(), Some(0));
//! ```

pub mod capability;
pub mod config;
pub mod engine;
pub mod focus;
pub mod persist;
pub mod settings;
pub mod snapshot;
pub mod source;
pub mod warning;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{step_target, ConfirmHost, Move, NavCapabilities, Navigation, RecordDisplay};
pub use config::{ListConfig, CACHE_EXTENSION};
pub use engine::edit::{DeleteOutcome, InsertOutcome, InsertPath, InsertStrategy};
pub use engine::{Dispatch, MaterializedList, ProgressFn};
pub use focus::FocusRegistry;
pub use persist::{CachedList, ListCache, SaveOutcome};
pub use settings::ListSettings;
pub use snapshot::Snapshot;
pub use source::{ClassExtentSource, ObjectSource, VectorSource};
pub use warning::Warning;
