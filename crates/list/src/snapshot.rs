//! Published list state.

use folio_core::ObjectId;
use std::rc::Rc;

/// The root-id projection and current index as of one commit.
///
/// Observers only ever see whole snapshots; the roots are shared, so
/// cloning a snapshot is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Number of commits so far.
    pub generation: u64,
    /// Root id of each row, in display order.
    pub roots: Rc<[ObjectId]>,
    /// Current index, `None` when empty.
    pub current: Option<usize>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            generation: 0,
            roots: Rc::from(Vec::new()),
            current: None,
        }
    }
}

impl Snapshot {
    /// Root id of the current row.
    pub fn current_root(&self) -> Option<ObjectId> {
        self.current.and_then(|i| self.roots.get(i).copied())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
