//! Events fired by observable lists.
//!
//! A `RecordsChanged` event carries the newly published snapshot plus the
//! roots that entered and left it since the previous one.

use folio_core::ObjectId;
use folio_list::{Snapshot, Warning};
use hashbrown::HashSet;

/// A change observers of a list are told about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// The rows were republished.
    RecordsChanged {
        snapshot: Snapshot,
        /// Roots present now but not before
        added: Vec<ObjectId>,
        /// Roots present before but not now
        removed: Vec<ObjectId>,
    },
    /// A different object became current.
    SelectionChanged {
        index: Option<usize>,
        object: Option<ObjectId>,
    },
    /// The active filter changed; `None` means no filter.
    FilterChanged { description: Option<String> },
    /// The sorter changed; `None` means source order.
    SorterChanged { name: Option<String> },
    /// Something was recovered from and the user should be told once.
    Warning(Warning),
}

impl ListEvent {
    /// Builds a `RecordsChanged` event by diffing the roots of two
    /// snapshots.
    pub fn records_changed(previous: &Snapshot, current: Snapshot) -> Self {
        let before: HashSet<ObjectId> = previous.roots.iter().copied().collect();
        let after: HashSet<ObjectId> = current.roots.iter().copied().collect();
        let added = dedup(current.roots.iter().copied().filter(|id| !before.contains(id)));
        let removed = dedup(previous.roots.iter().copied().filter(|id| !after.contains(id)));
        ListEvent::RecordsChanged {
            snapshot: current,
            added,
            removed,
        }
    }

    /// Returns true for `RecordsChanged`.
    #[inline]
    pub fn is_records_changed(&self) -> bool {
        matches!(self, ListEvent::RecordsChanged { .. })
    }
}

/// Collects ids in first-seen order, once each. Fanned-out rows repeat
/// their root.
fn dedup(ids: impl Iterator<Item = ObjectId>) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
