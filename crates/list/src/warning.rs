//! Recoverable problems reported to the user instead of failing.

use folio_core::ObjectId;
use thiserror::Error;

/// A condition the list recovered from, for the UI to show once.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("saved filter could not be restored and was cleared: {reason}")]
    FilterReset { reason: String },

    #[error("saved sort order could not be restored and was reset: {reason}")]
    SorterReset { reason: String },

    #[error("the current record {id} was deleted; selected the nearest remaining record")]
    CurrentDeleted { id: ObjectId },
}
