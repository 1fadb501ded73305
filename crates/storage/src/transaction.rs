//! Undoable tasks.
//!
//! A task groups the mutations of one user action (delete a record, insert
//! a record and its required child) so that they undo as one unit.

use crate::journal::{Journal, JournalEntry};
use folio_core::{Error, Result};

/// Transaction ID type.
pub type TransactionId = u64;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can record changes.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// An open task recording its changes.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    label: String,
    journal: Journal,
    state: TransactionState,
}

impl Transaction {
    /// Starts a task.
    pub fn begin(id: TransactionId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            journal: Journal::new(),
            state: TransactionState::Active,
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the user-facing label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::TransactionClosed);
        }
        Ok(())
    }

    /// Records a change.
    pub fn record(&mut self, entry: JournalEntry) -> Result<()> {
        self.check_active()?;
        self.journal.record(entry);
        Ok(())
    }

    /// Returns the journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Commits the transaction into an undoable unit.
    pub fn commit(mut self) -> Result<CommittedTask> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        Ok(CommittedTask {
            id: self.id,
            label: self.label,
            journal: self.journal,
        })
    }

    /// Marks the transaction rolled back and hands over its journal for
    /// reverting.
    pub fn rollback(mut self) -> Result<Journal> {
        self.check_active()?;
        self.state = TransactionState::RolledBack;
        Ok(self.journal)
    }
}

/// A committed task on the undo stack.
#[derive(Debug)]
pub struct CommittedTask {
    id: TransactionId,
    label: String,
    journal: Journal,
}

impl CommittedTask {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub(crate) fn into_journal(self) -> Journal {
        self.journal
    }
}

/// Bounded stack of committed tasks.
#[derive(Debug)]
pub struct UndoStack {
    tasks: Vec<CommittedTask>,
    limit: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoStack {
    /// Creates a stack that keeps at most `limit` tasks.
    pub fn new(limit: usize) -> Self {
        Self {
            tasks: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Pushes a task, dropping the oldest beyond the limit. Empty tasks are
    /// not kept.
    pub fn push(&mut self, task: CommittedTask) {
        if task.journal().is_empty() {
            return;
        }
        if self.tasks.len() == self.limit {
            self.tasks.remove(0);
        }
        self.tasks.push(task);
    }

    /// Pops the newest task.
    pub fn pop(&mut self) -> Option<CommittedTask> {
        self.tasks.pop()
    }

    /// Label of the task that would be undone next.
    pub fn peek_label(&self) -> Option<&str> {
        self.tasks.last().map(CommittedTask::label)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
