//! Narrow capability traits consumers compose instead of one wide
//! interface.

use crate::snapshot::Snapshot;
use folio_core::{DeleteConsequences, SortItem};

/// A navigation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    First,
    Next,
    Previous,
    Last,
}

/// Whether each step would change the current position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavCapabilities {
    pub first: bool,
    pub next: bool,
    pub previous: bool,
    pub last: bool,
}

impl NavCapabilities {
    pub fn allows(&self, step: Move) -> bool {
        match step {
            Move::First => self.first,
            Move::Next => self.next,
            Move::Previous => self.previous,
            Move::Last => self.last,
        }
    }
}

/// Index arithmetic shared by every navigable list. Steps clamp rather
/// than wrap.
pub fn step_target(len: usize, current: Option<usize>, step: Move) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    match step {
        Move::First => Some(0),
        Move::Last => Some(last),
        Move::Next => Some(current.map_or(0, |i| (i + 1).min(last))),
        Move::Previous => Some(current.map_or(0, |i| i.saturating_sub(1))),
    }
}

/// Current position and movement.
pub trait Navigation {
    fn current_index(&self) -> Option<usize>;

    fn set_current_index(&mut self, index: Option<usize>);

    /// Number of rows navigated over.
    fn row_count(&self) -> usize;

    /// Moves and returns the new current index.
    fn move_to(&mut self, step: Move) -> Option<usize> {
        let target = step_target(self.row_count(), self.current_index(), step);
        self.set_current_index(target);
        self.current_index()
    }

    fn capabilities(&self) -> NavCapabilities {
        let len = self.row_count();
        let current = self.current_index();
        let changes = |step| step_target(len, current, step) != current;
        NavCapabilities {
            first: changes(Move::First),
            next: changes(Move::Next),
            previous: changes(Move::Previous),
            last: changes(Move::Last),
        }
    }
}

/// Read access to the rows.
pub trait RecordDisplay {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item(&self, index: usize) -> Option<SortItem>;

    /// The last published state.
    fn snapshot(&self) -> Snapshot;
}

/// Asks the user to confirm a deletion.
pub trait ConfirmHost {
    fn confirm_delete(&mut self, consequences: &DeleteConsequences) -> bool;
}

impl<F> ConfirmHost for F
where
    F: FnMut(&DeleteConsequences) -> bool,
{
    fn confirm_delete(&mut self, consequences: &DeleteConsequences) -> bool {
        self(consequences)
    }
}
