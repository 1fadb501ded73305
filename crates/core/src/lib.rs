//! Folio Core - Core types for Folio record lists.
//!
//! This crate provides the foundational types shared by the record-list
//! engine and the stores it projects:
//!
//! - `ObjectId`, `PropertyId`, `ClassId`: identifiers of backing objects
//! - `SortItem`: one materialized row (key, root, path)
//! - `ChangeEvent`: typed mutation notifications
//! - `BackingStore` / `EditableStore`: the contract a store must honor
//! - `Error`: error types for list and store operations
//!
//! # Example
//!
//! ```rust
//! use folio_core::{ChangeEvent, SortItem};
//!
//! let row = SortItem::with_path(21, 1, vec![20, 21]);
//! assert!(row.depends_on(20));
//!
//! let ev = ChangeEvent::deleted(1, 7, 0, 20);
//! assert_eq!(ev.deleted_ids(), &[20]);
//! ```

mod error;
mod event;
mod ids;
mod item;
mod store;

pub use error::{Error, Result};
pub use event::ChangeEvent;
pub use ids::{ClassId, ObjectId, PropertyId, NULL_OBJECT};
pub use item::SortItem;
pub use store::{BackingStore, DeleteConsequences, DeletePolicy, EditableStore, ObjectResolver};
