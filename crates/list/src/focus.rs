//! Registry of focused objects.
//!
//! Lists report the object at their current index here so unrelated UI
//! elements can tell what is current without holding a list. The registry
//! is owned by the composition root and shared as `Rc<RefCell<_>>`.

use folio_core::ObjectId;
use hashbrown::HashMap;

/// Reference-counted set of focused objects.
#[derive(Debug, Default)]
pub struct FocusRegistry {
    counts: HashMap<ObjectId, usize>,
}

impl FocusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a focus reference to `id`.
    pub fn focus(&mut self, id: ObjectId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Drops a focus reference. Returns true if `id` is still focused by
    /// someone else.
    pub fn release(&mut self, id: ObjectId) -> bool {
        match self.counts.get_mut(&id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(&id);
                false
            }
            None => false,
        }
    }

    pub fn is_focused(&self, id: ObjectId) -> bool {
        self.counts.contains_key(&id)
    }

    /// Focused objects in id order.
    pub fn focused(&self) -> Vec<ObjectId> {
        let mut ids: Vec<_> = self.counts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
