//! Folio Storage - In-memory object store for Folio record lists.
//!
//! This crate provides a backing store the list engine can run against:
//!
//! - `ObjectStore`: objects with string fields and vector properties,
//!   ownership cascades on delete, and change events for every mutation
//! - `Journal`: per-task record of mutations with enough state to revert
//! - `Transaction` / `UndoStack`: open tasks and committed, undoable ones
//!
//! # Example
//!
//! ```rust
//! use folio_core::{BackingStore, EditableStore, ObjectResolver};
//! use folio_storage::ObjectStore;
//!
//! let mut store = ObjectStore::new();
//! let lexicon = store.load(1, &[]);
//! let entry = store.load_owned(lexicon, 10, 2, &[("Form", "run")]).unwrap();
//!
//! store.begin_task("Delete run").unwrap();
//! store.delete_object(entry).unwrap();
//! store.commit_task().unwrap();
//! assert!(!store.is_valid(entry));
//!
//! store.undo().unwrap();
//! assert_eq!(store.field(entry, "Form"), Some("run"));
//! ```

pub mod journal;
pub mod object;
pub mod store;
pub mod transaction;

pub use journal::{Journal, JournalEntry, Slot};
pub use object::{ObjectRecord, Ownership};
pub use store::{ObjectStore, FIELD_PROPERTY};
pub use transaction::{CommittedTask, Transaction, TransactionId, TransactionState, UndoStack};
