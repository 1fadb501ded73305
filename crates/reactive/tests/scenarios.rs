//! End-to-end scenarios: lists, the registry and a real object store.

use folio_algebra::{ExcludeIds, FieldFilter, FieldSorter, Filter, Matcher, Schema, SortKey};
use folio_core::{ClassId, DeleteConsequences, ObjectId, PropertyId};
use folio_list::{ListConfig, MaterializedList, Navigation, RecordDisplay, VectorSource, Warning};
use folio_reactive::{EventKind, ListEvent, ListRegistry, ObservableList};
use folio_storage::ObjectStore;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

const LEXICON: ClassId = 1;
const ENTRY: ClassId = 2;
const ENTRIES: PropertyId = 10;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("folio_list=debug,folio_reactive=debug")
        .with_test_writer()
        .try_init();
}

fn schema() -> Schema {
    Schema::new().with_field("Form").with_field("Gloss")
}

fn fruit_store() -> (ObjectStore, ObjectId, Vec<ObjectId>) {
    let mut store = ObjectStore::new();
    let lexicon = store.load(LEXICON, &[]);
    let ids = ["Apple", "Banana", "Cherry", "Date"]
        .iter()
        .map(|form| {
            store
                .load_owned(lexicon, ENTRIES, ENTRY, &[("Form", *form), ("Gloss", "fruit")])
                .unwrap()
        })
        .collect();
    (store, lexicon, ids)
}

fn config(name: &str) -> ListConfig {
    ListConfig::new(name).with_primary(false)
}

fn observable(config: ListConfig, lexicon: ObjectId, registry: &ListRegistry) -> Rc<RefCell<ObservableList>> {
    let sorter = FieldSorter::new(vec![SortKey::asc("Form")], &schema()).unwrap();
    let list = MaterializedList::new(config, VectorSource::new(lexicon, ENTRIES))
        .unwrap()
        .with_sorter(sorter, "Form")
        .with_focus_registry(registry.focus_registry());
    Rc::new(RefCell::new(ObservableList::new(list)))
}

fn record(list: &Rc<RefCell<ObservableList>>) -> Rc<RefCell<Vec<ListEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    list.borrow_mut()
        .subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

fn roots(list: &Rc<RefCell<ObservableList>>) -> Vec<ObjectId> {
    list.borrow().snapshot().roots.to_vec()
}

fn confirm_all(_: &DeleteConsequences) -> bool {
    true
}

#[test]
fn test_filtered_delete_keeps_position() {
    init_tracing();
    let (mut store, lexicon, ids) = fruit_store();
    let (apple, banana, cherry, date) = (ids[0], ids[1], ids[2], ids[3]);
    let mut registry = ListRegistry::new();
    let main = observable(config("main"), lexicon, &registry);
    let other = observable(config("other"), lexicon, &registry);
    let main_id = registry.register(&main);
    registry.register(&other);

    main.borrow_mut().activate(&store);
    other.borrow_mut().activate(&store);
    main.borrow_mut()
        .add_filter(Filter::Exclude(ExcludeIds::new([cherry])), &store);

    assert_eq!(roots(&main), vec![apple, banana, date]);
    assert_eq!(main.borrow().current_index(), Some(0));

    assert!(main.borrow_mut().jump_to_object(banana));
    let mut host = confirm_all;
    registry.delete_current(main_id, &mut store, &mut host).unwrap();

    assert_eq!(roots(&main), vec![apple, date]);
    assert_eq!(main.borrow().current_index(), Some(1));
    assert_eq!(roots(&other), vec![apple, cherry, date]);
}

#[test]
fn test_batch_publishes_once() {
    init_tracing();
    let (mut store, lexicon, _) = fruit_store();
    let mut registry = ListRegistry::new();
    let list = observable(config("batch"), lexicon, &registry);
    registry.register(&list);
    list.borrow_mut().activate(&store);
    let events = record(&list);

    registry.begin_broadcasting_changes(5);
    for form in ["Elder", "Fig", "Grape", "Kiwi", "Lime"] {
        let (_, changes) = store
            .create_owned(lexicon, ENTRIES, None, ENTRY, &[("Form", form)])
            .unwrap();
        registry.dispatch(&changes, &store);
    }
    assert!(events.borrow().is_empty());
    registry.end_broadcasting_changes(&store);

    let records = events
        .borrow()
        .iter()
        .filter(|event| event.is_records_changed())
        .count();
    assert_eq!(records, 1);
    assert_eq!(list.borrow().len(), 9);
}

#[test]
fn test_busy_list_rebuilds_on_next_dispatch() {
    init_tracing();
    let (mut store, lexicon, ids) = fruit_store();
    let mut registry = ListRegistry::new();
    let list = observable(config("busy"), lexicon, &registry);
    let id = registry.register(&list);
    list.borrow_mut().activate(&store);

    let deleted = store.delete(ids[0]).unwrap();
    list.borrow_mut().update(|_| registry.dispatch(&deleted, &store));
    assert!(registry.is_deferred(id));
    assert_eq!(list.borrow().len(), 4);

    let (_, created) = store
        .create_owned(lexicon, ENTRIES, None, ENTRY, &[("Form", "Zucchini")])
        .unwrap();
    registry.dispatch(&created, &store);

    assert!(!registry.is_deferred(id));
    assert_eq!(roots(&list), vec![ids[1], ids[2], ids[3], created_id(&created)]);
}

fn created_id(events: &[folio_core::ChangeEvent]) -> ObjectId {
    events
        .iter()
        .find_map(|event| event.inserted_ids().first().copied())
        .unwrap()
}

#[test]
fn test_shared_focus_is_ref_counted() {
    init_tracing();
    let (store, lexicon, ids) = fruit_store();
    let mut registry = ListRegistry::new();
    let first = observable(config("first"), lexicon, &registry);
    let second = observable(config("second"), lexicon, &registry);
    registry.register(&first);
    registry.register(&second);
    first.borrow_mut().activate(&store);
    second.borrow_mut().activate(&store);

    let focus = registry.focus_registry();
    assert!(focus.borrow().is_focused(ids[0]));
    assert_eq!(focus.borrow().len(), 1);

    first.borrow_mut().deactivate(&store);
    assert!(focus.borrow().is_focused(ids[0]));

    second.borrow_mut().move_to(folio_list::Move::Last);
    assert!(!focus.borrow().is_focused(ids[0]));
    assert_eq!(focus.borrow().focused(), vec![ids[3]]);
}

#[test]
fn test_undo_restores_rows() {
    init_tracing();
    let (mut store, lexicon, ids) = fruit_store();
    let mut registry = ListRegistry::new();
    let list = observable(config("undo"), lexicon, &registry);
    let id = registry.register(&list);
    list.borrow_mut().activate(&store);
    list.borrow_mut().jump_to_object(ids[2]);

    let mut host = confirm_all;
    registry.delete_current(id, &mut store, &mut host).unwrap();
    assert_eq!(roots(&list), vec![ids[0], ids[1], ids[3]]);
    assert_eq!(store.undo_label(), Some(format!("Delete record {}", ids[2]).as_str()));

    let events = store.undo().unwrap();
    registry.dispatch(&events, &store);
    assert_eq!(roots(&list), ids);
}

#[test]
fn test_cached_list_survives_reactivation() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (store, lexicon, ids) = fruit_store();
    let registry = ListRegistry::new();
    let cached = |dir: &Path| {
        ListConfig::new("entries")
            .with_cache_dir(dir)
            .with_item_class(ENTRY)
    };

    let first = observable(cached(dir.path()), lexicon, &registry);
    first.borrow_mut().activate(&store);
    first.borrow_mut().jump_to_index(2);
    first.borrow_mut().deactivate(&store);
    assert!(dir.path().join("entries.folio-list.json").exists());

    let second = observable(cached(dir.path()), lexicon, &registry);
    let events = record(&second);
    second.borrow_mut().activate(&store);

    assert_eq!(roots(&second), ids);
    assert_eq!(second.borrow().current_index(), Some(2));
    assert!(matches!(
        events.borrow().last(),
        Some(ListEvent::SelectionChanged { object: Some(id), .. }) if *id == ids[2]
    ));
    assert!(!dir.path().join("entries.folio-list.json").exists());
}

#[test]
fn test_stale_settings_publish_warnings() {
    init_tracing();
    let (store, lexicon, _) = fruit_store();
    let registry = ListRegistry::new();
    let list = observable(config("settings"), lexicon, &registry);
    list.borrow_mut().activate(&store);
    list.borrow_mut().set_filter(
        Filter::Field(FieldFilter::new("Gloss", Matcher::Equals("fruit".into()))),
        &store,
    );
    let saved = list.borrow().settings().unwrap();

    let warnings = Rc::new(RefCell::new(Vec::new()));
    let sink = warnings.clone();
    list.borrow_mut().subscribe_to(EventKind::Warning, move |event| {
        if let ListEvent::Warning(warning) = event {
            sink.borrow_mut().push(warning.clone());
        }
    });

    let mut without_gloss = schema();
    without_gloss.remove_field("Gloss");
    list.borrow_mut()
        .restore_settings(&saved, &without_gloss, &store);

    let warnings = warnings.borrow();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], Warning::FilterReset { .. }));
    assert_eq!(list.borrow().list().filter_status(), None);
    assert_eq!(list.borrow().list().sorter_name(), Some("Form"));
}
