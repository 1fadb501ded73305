//! Record workflows: deleting and inserting records through the list.
//!
//! Both run inside one undoable store task and feed the resulting change
//! events back into the list before returning them, so the caller only has
//! to forward them to other lists.

use super::MaterializedList;
use crate::capability::ConfirmHost;
use folio_core::{ChangeEvent, ClassId, DeletePolicy, EditableStore, Error, ObjectId, PropertyId, Result, SortItem};
use tracing::{debug, info, warn};

/// Where a new record goes relative to its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPath {
    /// Create the record in `property` of the owner.
    Direct { property: PropertyId },
    /// Create the record in `property`, then one required child of
    /// `child_class` in the record's `child_property`.
    WithChild {
        property: PropertyId,
        child_property: PropertyId,
        child_class: ClassId,
    },
}

/// How to create a new record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertStrategy {
    pub class: ClassId,
    /// Owner to insert under; defaults to the list's owning object.
    pub owner: Option<ObjectId>,
    pub path: InsertPath,
}

impl InsertStrategy {
    pub fn new(class: ClassId, property: PropertyId) -> Self {
        Self {
            class,
            owner: None,
            path: InsertPath::Direct { property },
        }
    }

    /// Also creates one child of `child_class` in `child_property`.
    pub fn with_child(mut self, child_property: PropertyId, child_class: ClassId) -> Self {
        let property = match self.path {
            InsertPath::Direct { property } | InsertPath::WithChild { property, .. } => property,
        };
        self.path = InsertPath::WithChild {
            property,
            child_property,
            child_class,
        };
        self
    }

    pub fn under(mut self, owner: ObjectId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Result of a delete workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { id: ObjectId, events: Vec<ChangeEvent> },
    /// The user declined the confirmation; nothing changed.
    Cancelled,
}

/// Result of an insert workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertOutcome {
    pub id: ObjectId,
    pub child: Option<ObjectId>,
    pub events: Vec<ChangeEvent>,
}

impl MaterializedList {
    /// Deletes the current record.
    pub fn delete_current<S: EditableStore>(
        &mut self,
        store: &mut S,
        host: &mut dyn ConfirmHost,
    ) -> Result<DeleteOutcome> {
        let id = self
            .current_object()
            .ok_or_else(|| Error::invalid_operation("no current record to delete"))?;
        self.delete_record(id, store, host)
    }

    /// Deletes `id` after checking the delete policy and asking for
    /// confirmation. Its rows leave the list before the store deletes it.
    pub fn delete_record<S: EditableStore>(
        &mut self,
        id: ObjectId,
        store: &mut S,
        host: &mut dyn ConfirmHost,
    ) -> Result<DeleteOutcome> {
        if let DeletePolicy::Refused(reason) = store.delete_policy(id) {
            debug!(list = %self.config.name, id, %reason, "delete refused");
            return Err(Error::not_deletable(id, reason));
        }
        let consequences = store.delete_consequences(id)?;
        if !host.confirm_delete(&consequences) {
            debug!(list = %self.config.name, id, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.pre_trim(id);

        store.begin_task(&format!("Delete record {id}"))?;
        let events = match store.delete_object(id) {
            Ok(events) => events,
            Err(e) => {
                if let Err(rollback) = store.rollback_task() {
                    warn!(list = %self.config.name, error = %rollback, "rollback failed");
                }
                self.reload(&*store);
                return Err(e);
            }
        };
        store.commit_task()?;

        info!(list = %self.config.name, id, "deleted record");
        self.handle_events(&events, &*store);
        Ok(DeleteOutcome::Deleted { id, events })
    }

    /// Drops the rows that show or pass through `id`. The row that takes
    /// the current position is the one that followed, or the new last row.
    pub(crate) fn pre_trim(&mut self, id: ObjectId) {
        let previous = self.previous_selection();
        let index = self.current_index();
        let before = self.items.len();
        self.items
            .retain(|item: &SortItem| item.root() != id && !item.depends_on(id));
        if self.items.len() == before {
            return;
        }

        let survivor = previous.and_then(|(key, _)| self.items.iter().position(|item| item.key() == key));
        let next = match (survivor, index) {
            (Some(found), _) => Some(found),
            _ if self.items.is_empty() => None,
            (None, Some(i)) => Some(i.min(self.items.len() - 1)),
            (None, None) => None,
        };
        self.current.set(next);
        self.commit();
    }

    /// Creates a new record per `strategy` in one undoable task, patches it
    /// into the list and makes it current.
    pub fn insert_record<S: EditableStore>(
        &mut self,
        store: &mut S,
        strategy: &InsertStrategy,
    ) -> Result<InsertOutcome> {
        let owner = strategy
            .owner
            .or_else(|| self.source.owner())
            .ok_or_else(|| Error::invalid_operation("no owning object to insert under"))?;

        store.begin_task("Insert record")?;
        let outcome = match create_records(store, owner, strategy) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback) = store.rollback_task() {
                    warn!(list = %self.config.name, error = %rollback, "rollback failed");
                }
                return Err(e);
            }
        };
        store.commit_task()?;

        info!(list = %self.config.name, id = outcome.id, "inserted record");
        self.handle_events(&outcome.events, &*store);
        self.jump_to_object(outcome.id);
        Ok(outcome)
    }
}

fn create_records<S: EditableStore>(
    store: &mut S,
    owner: ObjectId,
    strategy: &InsertStrategy,
) -> Result<InsertOutcome> {
    match strategy.path {
        InsertPath::Direct { property } => {
            let (id, events) = store.create_object(owner, property, strategy.class)?;
            Ok(InsertOutcome {
                id,
                child: None,
                events,
            })
        }
        InsertPath::WithChild {
            property,
            child_property,
            child_class,
        } => {
            let (id, mut events) = store.create_object(owner, property, strategy.class)?;
            let (child, child_events) = store.create_object(id, child_property, child_class)?;
            events.extend(child_events);
            Ok(InsertOutcome {
                id,
                child: Some(child),
                events,
            })
        }
    }
}
