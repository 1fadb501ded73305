//! The materialized record-list engine.
//!
//! `MaterializedList` projects the candidate ids of an [`ObjectSource`] into
//! an ordered, filtered, sorted sequence of [`SortItem`] rows and keeps a
//! self-healing current index into it. Every change to the rows ends in a
//! single commit that publishes the rows and the index together as a
//! [`Snapshot`].
//!
//! The engine never holds the backing store; every operation that reads
//! it takes the store as an argument. Notification routing lives in
//! [`dispatch`], record workflows in [`edit`].

pub mod dispatch;
pub mod edit;

use crate::capability::{Navigation, RecordDisplay};
use crate::config::ListConfig;
use crate::focus::FocusRegistry;
use crate::persist::{ListCache, SaveOutcome};
use crate::settings::ListSettings;
use crate::snapshot::Snapshot;
use crate::source::ObjectSource;
use crate::warning::Warning;
use folio_algebra::{collect_trivial, FieldSorter, Filter, Schema, Sorter};
use folio_core::{BackingStore, ObjectId, Result, SortItem};
use hashbrown::HashSet;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};

pub use dispatch::Dispatch;

/// Candidates between two progress reports during a full reload.
const PROGRESS_STRIDE: usize = 256;

/// Progress callback: fraction of the candidates processed so far.
pub type ProgressFn = Box<dyn FnMut(f32)>;

/// Ordered, filtered, sorted projection of a backing collection.
pub struct MaterializedList {
    config: ListConfig,
    source: Box<dyn ObjectSource>,
    filter: Filter,
    sorter: Option<Box<dyn Sorter>>,
    sorter_name: Option<String>,
    items: Vec<SortItem>,
    /// Self-healed on read, hence the cell.
    current: Cell<Option<usize>>,
    /// Last non-empty current index, or the one read from the cache.
    remembered: Option<usize>,
    active: bool,
    suppressed: bool,
    reload_requested: bool,
    /// Rows were dropped while suppressed and must be rebuilt.
    cleared: bool,
    /// One entry per open batch: the suppression state to restore, or
    /// `None` when the batch did not engage suppression.
    batches: Vec<Option<bool>>,
    generation: u64,
    snapshot: Snapshot,
    focus: Option<Rc<RefCell<FocusRegistry>>>,
    focused: Option<ObjectId>,
    progress: Option<ProgressFn>,
}

impl MaterializedList {
    /// Creates an empty list. Nothing is read until the first reload.
    pub fn new(config: ListConfig, source: impl ObjectSource + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source: Box::new(source),
            filter: Filter::Null,
            sorter: None,
            sorter_name: None,
            items: Vec::new(),
            current: Cell::new(None),
            remembered: None,
            active: false,
            suppressed: false,
            reload_requested: false,
            cleared: false,
            batches: Vec::new(),
            generation: 0,
            snapshot: Snapshot::default(),
            focus: None,
            focused: None,
            progress: None,
        })
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sorter(mut self, sorter: impl Sorter + 'static, name: impl Into<String>) -> Self {
        self.sorter = Some(Box::new(sorter));
        self.sorter_name = Some(name.into());
        self
    }

    /// Reports the current row to a shared focus registry.
    pub fn with_focus_registry(mut self, registry: Rc<RefCell<FocusRegistry>>) -> Self {
        self.focus = Some(registry);
        self
    }

    /// Installs a progress callback for full reloads. It cannot abort the
    /// reload.
    pub fn with_progress(mut self, progress: impl FnMut(f32) + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn source(&self) -> &dyn ObjectSource {
        self.source.as_ref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn sorter(&self) -> Option<&dyn Sorter> {
        self.sorter.as_deref()
    }

    pub fn sorter_name(&self) -> Option<&str> {
        self.sorter_name.as_deref()
    }

    /// The rows, in display order.
    pub fn items(&self) -> &[SortItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&SortItem> {
        self.items.get(index)
    }

    /// Number of commits so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The last published state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Returns true if a reload was requested while suppressed.
    pub fn reload_pending(&self) -> bool {
        self.reload_requested
    }

    fn in_final_order(&self) -> bool {
        self.config.source_in_final_order || self.source.in_final_order()
    }

    // ------------------------------------------------------------------
    // Current index
    // ------------------------------------------------------------------

    /// Returns the current index, repairing it if it no longer fits the
    /// rows.
    pub fn current_index(&self) -> Option<usize> {
        let len = self.items.len();
        match self.current.get() {
            Some(index) if len == 0 => {
                warn!(list = %self.config.name, index, "current index set on an empty list, clearing");
                self.current.set(None);
                None
            }
            Some(index) if index >= len => {
                warn!(list = %self.config.name, index, len, "current index out of range, resetting to 0");
                self.current.set(Some(0));
                Some(0)
            }
            None if len > 0 => {
                warn!(list = %self.config.name, len, "no current index on a non-empty list, resetting to 0");
                self.current.set(Some(0));
                Some(0)
            }
            current => current,
        }
    }

    /// Moves the current index. Does nothing if the row at `index` shows
    /// the same object as the current row.
    pub fn set_current_index(&mut self, index: Option<usize>) {
        let old_key = self.current_object();
        let new_key = index.and_then(|i| self.items.get(i)).map(SortItem::key);
        if old_key == new_key {
            return;
        }
        self.current.set(index);
        let current = self.current_index();
        if current.is_some() {
            self.remembered = current;
        }
        self.snapshot.current = current;
        self.sync_focus();
    }

    pub fn current_item(&self) -> Option<&SortItem> {
        self.current_index().and_then(|i| self.items.get(i))
    }

    /// Key object of the current row.
    pub fn current_object(&self) -> Option<ObjectId> {
        self.current_item().map(SortItem::key)
    }

    /// Root object of the current row.
    pub fn current_root(&self) -> Option<ObjectId> {
        self.current_item().map(SortItem::root)
    }

    /// Makes the first row showing `id` (as key, else as root) current.
    pub fn jump_to_object(&mut self, id: ObjectId) -> bool {
        let position = self
            .items
            .iter()
            .position(|item| item.key() == id)
            .or_else(|| self.items.iter().position(|item| item.root() == id));
        match position {
            Some(index) => {
                self.set_current_index(Some(index));
                true
            }
            None => false,
        }
    }

    /// Makes row `index` current if it exists.
    pub fn jump_to_index(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.set_current_index(Some(index));
        true
    }

    /// Index to select after the rows were rebuilt: the previous current
    /// object if it survived, else the remembered index clamped.
    fn resolve_index(&self, items: &[SortItem], previous: Option<(ObjectId, ObjectId)>) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        if let Some((key, root)) = previous {
            let found = items
                .iter()
                .position(|item| item.key() == key)
                .or_else(|| items.iter().position(|item| item.root() == root));
            if found.is_some() {
                return found;
            }
        }
        Some(self.remembered.map_or(0, |i| i.min(items.len() - 1)))
    }

    fn previous_selection(&self) -> Option<(ObjectId, ObjectId)> {
        self.current_item().map(|item| (item.key(), item.root()))
    }

    // ------------------------------------------------------------------
    // Reload
    // ------------------------------------------------------------------

    /// Rebuilds every row from the source.
    ///
    /// While suppressed the request is only recorded. If the owning object
    /// is gone the list is emptied.
    pub fn reload(&mut self, store: &dyn BackingStore) -> Dispatch {
        if self.suppressed {
            debug!(list = %self.config.name, "reload deferred while suppressed");
            self.reload_requested = true;
            return Dispatch::Deferred;
        }
        if let Some(owner) = self.source.owner() {
            if !store.is_valid(owner) {
                debug!(list = %self.config.name, owner, "owning object gone, clearing list");
                self.items.clear();
                self.current.set(None);
                self.cleared = false;
                self.commit();
                return Dispatch::Reloaded;
            }
        }

        let previous = self.previous_selection();
        let candidates = self.source.candidates(store);
        let mut items = self.build_items(&candidates, store);
        if !self.in_final_order() {
            if let Some(sorter) = &self.sorter {
                sorter.sort(&mut items, store);
            }
        }

        let index = self.resolve_index(&items, previous);
        debug!(list = %self.config.name, candidates = candidates.len(), len = items.len(), "full reload");
        self.items = items;
        self.current.set(index);
        self.cleared = false;
        self.commit();
        Dispatch::Reloaded
    }

    fn build_items(&mut self, candidates: &[ObjectId], store: &dyn BackingStore) -> Vec<SortItem> {
        let total = candidates.len();
        let mut items = Vec::with_capacity(total);
        for (done, &root) in candidates.iter().enumerate() {
            items.extend(rows_for(self.sorter.as_deref(), &self.filter, root, store));
            if let Some(progress) = self.progress.as_mut() {
                if done % PROGRESS_STRIDE == 0 {
                    progress(done as f32 / total as f32);
                }
            }
        }
        if let Some(progress) = self.progress.as_mut() {
            progress(1.0);
        }
        items
    }

    /// Patches the rows for a change of `(start, inserted, deleted)` in the
    /// tracked property. Only a single insertion, with at most one deletion,
    /// into a list of more than one row is patched in place; everything
    /// else is a full reload.
    pub fn reload_range(
        &mut self,
        store: &dyn BackingStore,
        start: usize,
        inserted: usize,
        deleted: usize,
    ) -> Dispatch {
        if inserted != 1 || deleted > 1 || self.items.len() <= 1 {
            return self.reload(store);
        }
        if self.suppressed {
            self.reload_requested = true;
            return Dispatch::Deferred;
        }
        if self.source.owner().is_some_and(|owner| !store.is_valid(owner)) {
            return self.reload(store);
        }

        let candidates = self.source.candidates(store);
        let Some(&new_root) = candidates.get(start) else {
            debug!(list = %self.config.name, start, "insertion outside the source, full reload");
            return self.reload(store);
        };

        let previous = self.previous_selection();
        let live: HashSet<ObjectId> = candidates.iter().copied().collect();
        self.items
            .retain(|item| item.root() != new_root && live.contains(&item.root()) && item.is_valid(store));

        let rows = rows_for(self.sorter.as_deref(), &self.filter, new_root, store);
        let ordered = !self.in_final_order();
        match self.sorter.as_deref().filter(|_| ordered) {
            Some(sorter) => sorter.merge_into(&mut self.items, rows, store),
            None => {
                let at = guess_insert_position(&candidates, &self.items, new_root)
                    .unwrap_or(self.items.len());
                self.items.splice(at..at, rows);
            }
        }

        let index = self.resolve_index(&self.items, previous);
        debug!(list = %self.config.name, start, root = new_root, len = self.items.len(), "patched list");
        self.current.set(index);
        self.commit();
        Dispatch::Patched
    }

    /// Publishes the rows and the current index as one snapshot.
    fn commit(&mut self) {
        self.generation += 1;
        let current = self.current_index();
        if current.is_some() {
            self.remembered = current;
        }
        let roots: Rc<[ObjectId]> = self.items.iter().map(SortItem::root).collect();
        self.snapshot = Snapshot {
            generation: self.generation,
            roots,
            current,
        };
        self.sync_focus();
        debug!(list = %self.config.name, generation = self.generation, len = self.items.len(), index = ?current, "commit");
    }

    fn sync_focus(&mut self) {
        let key = self.current_object();
        if key == self.focused {
            return;
        }
        if let Some(registry) = &self.focus {
            let Ok(mut registry) = registry.try_borrow_mut() else {
                warn!(list = %self.config.name, "focus registry busy, focus not updated");
                return;
            };
            if let Some(old) = self.focused {
                registry.release(old);
            }
            if let Some(new) = key {
                registry.focus(new);
            }
        }
        self.focused = key;
    }

    fn release_focus(&mut self) {
        let Some(old) = self.focused else {
            return;
        };
        if let Some(registry) = &self.focus {
            let Ok(mut registry) = registry.try_borrow_mut() else {
                warn!(list = %self.config.name, "focus registry busy, focus not released");
                return;
            };
            registry.release(old);
        }
        self.focused = None;
    }

    // ------------------------------------------------------------------
    // Suppression and batching
    // ------------------------------------------------------------------

    /// Engages or lifts suppression. Lifting it performs a reload that was
    /// requested meanwhile.
    pub fn set_suppressed(&mut self, store: &dyn BackingStore, suppressed: bool) {
        if suppressed == self.suppressed {
            return;
        }
        self.suppressed = suppressed;
        if suppressed {
            if self.config.clear_when_suppressed && !self.active && !self.items.is_empty() {
                debug!(list = %self.config.name, "clearing rows while suppressed");
                self.items.clear();
                self.current.set(None);
                self.cleared = true;
                self.commit();
            }
        } else if self.reload_requested || self.cleared {
            self.reload_requested = false;
            self.reload(store);
        }
    }

    /// Starts a batch of `expected` notifications. Batches of more than one
    /// notification are suppressed until [`Self::end_broadcasting_changes`].
    pub fn begin_broadcasting_changes(&mut self, expected: usize) {
        if expected > 1 {
            self.batches.push(Some(self.suppressed));
            self.suppressed = true;
        } else {
            self.batches.push(None);
        }
    }

    /// Ends the innermost batch, performing at most one reload.
    pub fn end_broadcasting_changes(&mut self, store: &dyn BackingStore) {
        match self.batches.pop() {
            Some(Some(previous)) => self.set_suppressed(store, previous),
            Some(None) => {}
            None => warn!(list = %self.config.name, "end of batch without a matching begin"),
        }
    }

    // ------------------------------------------------------------------
    // Activation and persistence
    // ------------------------------------------------------------------

    /// Activates the list: seeds it from the cache file if allowed, else
    /// rebuilds it.
    pub fn activate(&mut self, store: &dyn BackingStore) {
        info!(list = %self.config.name, "activating list");
        self.active = true;
        self.suppressed = false;
        self.reload_requested = false;
        if !(self.config.primary && self.restore(store)) {
            self.reload(store);
        }
    }

    /// Deactivates the list: persists it if primary, releases focus and
    /// suppresses reloads until the next activation.
    pub fn deactivate(&mut self, store: &dyn BackingStore) {
        info!(list = %self.config.name, "deactivating list");
        if self.config.primary {
            self.persist(store);
        }
        self.active = false;
        self.set_suppressed(store, true);
        self.release_focus();
    }

    /// Writes the rows to the side file. Failures are logged and ignored.
    pub fn persist(&self, store: &dyn BackingStore) -> bool {
        let Some(path) = self.config.cache_path() else {
            return false;
        };
        let cache = ListCache::new(path);
        match cache.save(&self.items, self.current_index(), store) {
            Ok(SaveOutcome::Written) => {
                info!(list = %self.config.name, path = %cache.path().display(), len = self.items.len(), "persisted list");
                true
            }
            Ok(SaveOutcome::SkippedInvalid) => false,
            Err(e) => {
                warn!(list = %self.config.name, error = %e, "failed to persist list");
                false
            }
        }
    }

    /// Seeds the rows from the side file. Refused once an instance of the
    /// item class was created in this session; the file is consumed either
    /// way. Returns true if rows were restored.
    pub fn restore(&mut self, store: &dyn BackingStore) -> bool {
        let Some(path) = self.config.cache_path() else {
            return false;
        };
        let cache = ListCache::new(path);
        if !cache.exists() {
            return false;
        }
        let stale = self.config.item_class.map_or(true, |class| store.created_in_session(class))
            || self.source.owner().is_some_and(|owner| !store.is_valid(owner));
        if stale {
            debug!(list = %self.config.name, "cache may be stale, rebuilding instead");
            if let Err(e) = cache.discard() {
                warn!(list = %self.config.name, error = %e, "failed to remove list cache");
            }
            return false;
        }

        match cache.take() {
            Ok(Some(cached)) => {
                let mut items = cached.items;
                items.retain(|item| item.is_valid(store));
                self.remembered = cached.current;
                let index = self.resolve_index(&items, None);
                info!(list = %self.config.name, len = items.len(), "restored list from cache");
                self.items = items;
                self.current.set(index);
                self.cleared = false;
                self.commit();
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(list = %self.config.name, error = %e, "unreadable list cache, rebuilding");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Filter and sorter
    // ------------------------------------------------------------------

    /// Conjoins `filter` with the active filter and reloads.
    pub fn add_filter(&mut self, filter: Filter, store: &dyn BackingStore) {
        let active = std::mem::take(&mut self.filter);
        self.filter = active.and(filter);
        self.reload(store);
    }

    /// Removes `filter` from the active filter and reloads. A conjunction
    /// left with one child becomes that child.
    pub fn remove_filter(&mut self, filter: &Filter, store: &dyn BackingStore) {
        let active = std::mem::take(&mut self.filter);
        self.filter = active.without(filter);
        self.reload(store);
    }

    pub fn set_filter(&mut self, filter: Filter, store: &dyn BackingStore) {
        self.filter = filter;
        self.reload(store);
    }

    /// Describes the active filter, `None` when there is none.
    pub fn filter_status(&self) -> Option<String> {
        if self.filter.is_null() {
            None
        } else {
            Some(self.filter.describe())
        }
    }

    /// Replaces the sorter and reloads.
    pub fn set_sorter(
        &mut self,
        sorter: Option<Box<dyn Sorter>>,
        name: Option<String>,
        store: &dyn BackingStore,
    ) {
        self.sorter = sorter;
        self.sorter_name = if self.sorter.is_some() { name } else { None };
        self.reload(store);
    }

    /// Descriptors of the active filter and sorter.
    pub fn settings(&self) -> Result<ListSettings> {
        let filter = if self.filter.is_null() {
            None
        } else {
            Some(self.filter.descriptor()?)
        };
        let sorter = match &self.sorter {
            Some(sorter) => Some(sorter.descriptor()?),
            None => None,
        };
        Ok(ListSettings {
            filter,
            sorter,
            sorter_name: self.sorter_name.clone(),
        })
    }

    /// Rebuilds the filter and sorter from saved descriptors and reloads.
    /// A descriptor naming something the schema no longer has resets that
    /// component and yields one warning.
    pub fn restore_settings(
        &mut self,
        settings: &ListSettings,
        schema: &Schema,
        store: &dyn BackingStore,
    ) -> Vec<Warning> {
        let mut warnings = Vec::new();

        self.filter = match settings.filter.as_deref() {
            None => Filter::Null,
            Some(descriptor) => match Filter::from_descriptor(descriptor, schema) {
                Ok(filter) => filter,
                Err(e) => {
                    warn!(list = %self.config.name, error = %e, "saved filter rejected, clearing it");
                    warnings.push(Warning::FilterReset {
                        reason: e.to_string(),
                    });
                    Filter::Null
                }
            },
        };

        let sorter = match settings.sorter.as_deref() {
            None => None,
            Some(descriptor) => match FieldSorter::from_descriptor(descriptor, schema) {
                Ok(sorter) => Some(Box::new(sorter) as Box<dyn Sorter>),
                Err(e) => {
                    warn!(list = %self.config.name, error = %e, "saved sorter rejected, using default order");
                    warnings.push(Warning::SorterReset {
                        reason: e.to_string(),
                    });
                    None
                }
            },
        };
        self.sorter_name = sorter.as_ref().and(settings.sorter_name.clone());
        self.sorter = sorter;

        self.reload(store);
        warnings
    }

    // ------------------------------------------------------------------
    // Validity
    // ------------------------------------------------------------------

    /// Repairs the selection after the current object was deleted out from
    /// under the list: drops invalid rows and selects the nearest valid one,
    /// searching forward first. Returns a warning if a repair happened.
    pub fn ensure_current_valid(&mut self, store: &dyn BackingStore) -> Option<Warning> {
        let index = self.current_index()?;
        let current = self.items.get(index)?;
        if current.is_valid(store) {
            return None;
        }
        let id = current.key();
        let valid = |item: &SortItem| item.is_valid(store);

        let target = (index + 1..self.items.len())
            .find(|&i| valid(&self.items[i]))
            .or_else(|| (0..index).rev().find(|&i| valid(&self.items[i])));
        let new_index = target.map(|t| self.items[..t].iter().filter(|item| valid(item)).count());

        self.items.retain(|item| valid(item));
        self.current.set(new_index);
        self.commit();
        warn!(list = %self.config.name, id, index = ?new_index, "current record was deleted");
        Some(Warning::CurrentDeleted { id })
    }
}

/// Rows for one candidate: expanded by the sorter (or one trivial row),
/// then kept only if valid and accepted by the filter.
fn rows_for(
    sorter: Option<&dyn Sorter>,
    filter: &Filter,
    root: ObjectId,
    store: &dyn BackingStore,
) -> Vec<SortItem> {
    let mut rows = Vec::new();
    match sorter {
        Some(sorter) => sorter.collect_items(root, store, &mut rows),
        None => collect_trivial(root, &mut rows),
    }
    rows.retain(|row| row.is_valid(store) && filter.accept(row, store));
    rows
}

/// Guesses where the rows of `new_root` go in an unsorted list by walking
/// the candidates and the rows in lockstep. Returns `None` when the rows
/// are not in candidate order, in which case the caller appends.
fn guess_insert_position(candidates: &[ObjectId], items: &[SortItem], new_root: ObjectId) -> Option<usize> {
    let shown: HashSet<ObjectId> = items.iter().map(SortItem::root).collect();
    let mut row = 0;
    for &id in candidates {
        if id == new_root {
            return Some(row);
        }
        if !shown.contains(&id) {
            continue;
        }
        if items.get(row).map(SortItem::root) != Some(id) {
            return None;
        }
        while items.get(row).map(SortItem::root) == Some(id) {
            row += 1;
        }
    }
    None
}

impl Navigation for MaterializedList {
    fn current_index(&self) -> Option<usize> {
        MaterializedList::current_index(self)
    }

    fn set_current_index(&mut self, index: Option<usize>) {
        MaterializedList::set_current_index(self, index)
    }

    fn row_count(&self) -> usize {
        self.items.len()
    }
}

impl RecordDisplay for MaterializedList {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn item(&self, index: usize) -> Option<SortItem> {
        self.items.get(index).cloned()
    }

    fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }
}
