//! Folio Algebra - Filter and sorter composition for Folio record lists.
//!
//! # Core Concepts
//!
//! - `Filter`: a predicate over sort items; `Filter::Null` means "no filter"
//!   and conjunctions collapse when reduced to one child
//! - `Sorter`: expands backing objects into rows and totally orders them
//! - `FieldSorter`: the stock sorter, ordering by string fields with
//!   per-writing-system collation and optional hierarchical fan-out
//! - `Schema`: the fields and writing systems descriptors are checked against
//!
//! Both filters and sorters serialize to opaque descriptor strings and can
//! be rebuilt from them; rebuilding fails cleanly when the descriptor names
//! something the schema no longer has.
//!
//! # Example
//!
//! ```rust
//! use folio_algebra::{FieldFilter, Filter, Matcher};
//!
//! let f1 = Filter::Field(FieldFilter::new("Form", Matcher::NonEmpty));
//! let f2 = Filter::Field(FieldFilter::new("Gloss", Matcher::Contains("run".into())));
//! let active = f1.clone().and(f2.clone());
//!
//! // Removing one of two children leaves the other, not a one-child And.
//! assert_eq!(active.without(&f1), f2);
//! ```

pub mod filter;
pub mod schema;
pub mod sorter;

#[cfg(test)]
pub(crate) mod testing;

pub use filter::{AndFilter, ClassFilter, ExcludeIds, FieldFilter, Filter, Matcher};
pub use schema::{Collation, Schema};
pub use sorter::{collect_trivial, FanOut, FieldSorter, Order, SortKey, Sorter};
