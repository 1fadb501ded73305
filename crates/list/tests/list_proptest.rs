//! Property-based tests for the materialized list engine using proptest.

use folio_algebra::{FanOut, FieldFilter, FieldSorter, Filter, Matcher, Schema, SortKey, Sorter};
use folio_core::{BackingStore, ObjectId, SortItem};
use folio_list::{ListConfig, MaterializedList, VectorSource};
use folio_storage::ObjectStore;
use proptest::prelude::*;

const LEXICON: u32 = 1;
const ENTRY: u32 = 2;
const SENSE: u32 = 3;
const ENTRIES: u32 = 10;
const SENSES: u32 = 11;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("folio_list=warn")
        .with_test_writer()
        .try_init();
}

fn schema() -> Schema {
    Schema::new().with_field("Form")
}

fn build_store(forms: &[String]) -> (ObjectStore, ObjectId) {
    let mut store = ObjectStore::new();
    let lexicon = store.load(LEXICON, &[]);
    for form in forms {
        store
            .load_owned(lexicon, ENTRIES, ENTRY, &[("Form", form.as_str())])
            .unwrap();
    }
    (store, lexicon)
}

fn sorter() -> FieldSorter {
    FieldSorter::new(vec![SortKey::asc("Form")], &schema()).unwrap()
}

fn filter(letter: Option<char>) -> Filter {
    match letter {
        Some(c) => Filter::Field(FieldFilter::new("Form", Matcher::Contains(c.to_string()))),
        None => Filter::Null,
    }
}

fn build_list(lexicon: ObjectId, sorted: bool, letter: Option<char>) -> MaterializedList {
    build_fanned_list(lexicon, sorted, false, letter)
}

/// Like `build_list`; with `fan_out` a sorted list shows one row per sense.
fn build_fanned_list(lexicon: ObjectId, sorted: bool, fan_out: bool, letter: Option<char>) -> MaterializedList {
    let list = MaterializedList::new(ListConfig::new("entries"), VectorSource::new(lexicon, ENTRIES))
        .unwrap()
        .with_filter(filter(letter));
    match (sorted, fan_out) {
        (true, true) => list.with_sorter(sorter().with_fan_out(FanOut::new(vec![SENSES])), "Sense"),
        (true, false) => list.with_sorter(sorter(), "Form"),
        (false, _) => list,
    }
}

/// Gives `entry` one sense per character of its form, some entries none.
fn add_senses(store: &mut ObjectStore, entry: ObjectId) {
    let form = store.field(entry, "Form").unwrap_or_default().to_owned();
    for (i, c) in form.chars().enumerate().skip(1) {
        store
            .load_owned(entry, SENSES, SENSE, &[("Form", format!("{c}{i}").as_str())])
            .unwrap();
    }
}

fn roots(list: &MaterializedList) -> Vec<ObjectId> {
    list.items().iter().map(SortItem::root).collect()
}

fn forms_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-d]{1,3}", 0..40)
}

fn letter_strategy() -> impl Strategy<Value = Option<char>> {
    prop::option::of(prop::sample::select(vec!['a', 'b', 'c']))
}

proptest! {
    /// A full reload equals the candidates expanded, filtered and sorted.
    #[test]
    fn reload_matches_definition(
        forms in forms_strategy(),
        letter in letter_strategy(),
        sorted in any::<bool>(),
    ) {
        let (store, lexicon) = build_store(&forms);
        let mut list = build_list(lexicon, sorted, letter);
        list.reload(&store);

        let expected_filter = filter(letter);
        let mut expected: Vec<SortItem> = store
            .vector(lexicon, ENTRIES)
            .iter()
            .map(|&id| SortItem::new(id))
            .filter(|item| expected_filter.accept(item, &store))
            .collect();
        if sorted {
            sorter().sort(&mut expected, &store);
        }

        prop_assert_eq!(list.items(), expected.as_slice());
        prop_assert_eq!(list.current_index(), if expected.is_empty() { None } else { Some(0) });
    }

    /// Two reloads without an intervening change agree.
    #[test]
    fn reload_is_idempotent(
        forms in forms_strategy(),
        letter in letter_strategy(),
        sorted in any::<bool>(),
        pick in any::<prop::sample::Index>(),
    ) {
        let (store, lexicon) = build_store(&forms);
        let mut list = build_list(lexicon, sorted, letter);
        list.reload(&store);
        if !list.is_empty() {
            list.set_current_index(Some(pick.index(list.len())));
        }
        let first = roots(&list);
        let index = list.current_index();

        list.reload(&store);
        prop_assert_eq!(roots(&list), first);
        prop_assert_eq!(list.current_index(), index);
    }

    /// Patching a single insertion gives the same rows as a full reload.
    #[test]
    fn single_insertion_matches_full_reload(
        forms in prop::collection::vec("[a-d]{1,3}", 2..40),
        new_form in "[a-d]{1,3}",
        at in any::<prop::sample::Index>(),
        letter in letter_strategy(),
        sorted in any::<bool>(),
        fan_out in any::<bool>(),
    ) {
        init_tracing();
        let (mut store, lexicon) = build_store(&forms);
        if fan_out {
            for entry in store.vector(lexicon, ENTRIES).to_vec() {
                add_senses(&mut store, entry);
            }
        }
        let mut patched = build_fanned_list(lexicon, sorted, fan_out, letter);
        patched.reload(&store);

        let index = at.index(forms.len() + 1);
        let (entry, events) = store
            .create_owned(lexicon, ENTRIES, Some(index), ENTRY, &[("Form", new_form.as_str())])
            .unwrap();
        if fan_out {
            add_senses(&mut store, entry);
        }
        patched.handle_events(&events, &store);

        let mut rebuilt = build_fanned_list(lexicon, sorted, fan_out, letter);
        rebuilt.reload(&store);

        prop_assert_eq!(patched.items(), rebuilt.items());
    }

    /// Deleting a row keeps the others in order and moves the selection to
    /// the following row when the current one goes.
    #[test]
    fn deletion_is_local(
        forms in prop::collection::vec("[a-d]{1,3}", 1..40),
        sorted in any::<bool>(),
        current in any::<prop::sample::Index>(),
        doomed in any::<prop::sample::Index>(),
    ) {
        let (mut store, lexicon) = build_store(&forms);
        let mut list = build_list(lexicon, sorted, None);
        list.reload(&store);

        let current = current.index(list.len());
        list.set_current_index(Some(current));
        let before = roots(&list);
        let current_id = before[current];
        let doomed_index = doomed.index(before.len());
        let doomed_id = before[doomed_index];

        let events = store.delete(doomed_id).unwrap();
        list.handle_events(&events, &store);

        let expected: Vec<ObjectId> = before.iter().copied().filter(|&id| id != doomed_id).collect();
        prop_assert_eq!(roots(&list), expected.clone());

        if doomed_id == current_id {
            let following = if expected.is_empty() { None } else { Some(current.min(expected.len() - 1)) };
            prop_assert_eq!(list.current_index(), following);
        } else {
            prop_assert_eq!(list.current_root(), Some(current_id));
        }
    }

    /// Persist then restore reconstructs the rows exactly.
    #[test]
    fn persist_restore_round_trip(
        forms in prop::collection::vec("[a-d]{1,3}", 1..30),
        letter in letter_strategy(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let (store, lexicon) = build_store(&forms);
        let config = ListConfig::new("entries")
            .with_cache_dir(dir.path())
            .with_item_class(ENTRY);

        let mut list = MaterializedList::new(config.clone(), VectorSource::new(lexicon, ENTRIES))
            .unwrap()
            .with_sorter(sorter(), "Form")
            .with_filter(filter(letter));
        list.reload(&store);
        prop_assert!(list.persist(&store));

        let mut restored = MaterializedList::new(config, VectorSource::new(lexicon, ENTRIES)).unwrap();
        prop_assert!(restored.restore(&store));
        prop_assert_eq!(restored.items(), list.items());
    }
}
