//! Fixtures for unit tests: a small lexicon of entries.

use crate::config::ListConfig;
use crate::engine::MaterializedList;
use crate::source::VectorSource;
use folio_algebra::{Collation, FieldSorter, Schema, SortKey};
use folio_core::{ClassId, ObjectId, PropertyId};
use folio_storage::ObjectStore;

pub(crate) const LEXICON: ClassId = 1;
pub(crate) const ENTRY: ClassId = 2;
pub(crate) const SENSE: ClassId = 3;
pub(crate) const ENTRIES: PropertyId = 10;
pub(crate) const SENSES: PropertyId = 11;

pub(crate) fn schema() -> Schema {
    Schema::new()
        .with_field("Form")
        .with_field("Gloss")
        .with_writing_system("en", Collation::CaseInsensitive)
}

/// A lexicon owning one entry per form, loaded (not created) so the store
/// reports no session creations.
pub(crate) fn fruit_store(forms: &[&str]) -> (ObjectStore, ObjectId, Vec<ObjectId>) {
    let mut store = ObjectStore::new();
    let lexicon = store.load(LEXICON, &[]);
    let ids = forms
        .iter()
        .map(|form| {
            store
                .load_owned(lexicon, ENTRIES, ENTRY, &[("Form", form)])
                .unwrap()
        })
        .collect();
    (store, lexicon, ids)
}

/// Entries of `lexicon` sorted by form.
pub(crate) fn fruit_list(lexicon: ObjectId) -> MaterializedList {
    let sorter = FieldSorter::new(vec![SortKey::asc("Form")], &schema()).unwrap();
    MaterializedList::new(ListConfig::new("entries"), VectorSource::new(lexicon, ENTRIES))
        .unwrap()
        .with_sorter(sorter, "Form")
}
