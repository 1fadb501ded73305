//! Error types for Folio record lists.

use crate::ids::ObjectId;
use thiserror::Error;

/// Result type alias for Folio operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for record-list and backing-store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The identifier does not resolve to a live object.
    #[error("object {id} not found")]
    ObjectNotFound { id: ObjectId },
    /// The deletion policy refused the object.
    #[error("object {id} cannot be deleted: {reason}")]
    NotDeletable { id: ObjectId, reason: String },
    /// A descriptor names a field the schema no longer has.
    #[error("unknown field: {field}")]
    UnknownField { field: String },
    /// A descriptor names a writing system the schema does not know.
    #[error("unknown writing system: {id}")]
    UnknownWritingSystem { id: String },
    /// A descriptor string could not be parsed.
    #[error("malformed descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
    /// File I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration value was rejected.
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    /// The operation is not valid in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },
    /// The transaction was already committed or rolled back.
    #[error("transaction is not active")]
    TransactionClosed,
}

impl Error {
    /// Creates an object-not-found error.
    pub fn not_found(id: ObjectId) -> Self {
        Error::ObjectNotFound { id }
    }

    /// Creates a not-deletable error.
    pub fn not_deletable(id: ObjectId, reason: impl Into<String>) -> Self {
        Error::NotDeletable {
            id,
            reason: reason.into(),
        }
    }

    /// Creates an unknown-field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Error::UnknownField {
            field: field.into(),
        }
    }

    /// Creates an unknown-writing-system error.
    pub fn unknown_writing_system(id: impl Into<String>) -> Self {
        Error::UnknownWritingSystem { id: id.into() }
    }

    /// Creates an invalid-config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this error came from a descriptor that references a
    /// schema element that is gone or from a malformed descriptor.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            Error::UnknownField { .. } | Error::UnknownWritingSystem { .. } | Error::Descriptor(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found(42);
        assert!(err.to_string().contains("42"));

        let err = Error::unknown_field("Gloss");
        assert!(err.to_string().contains("Gloss"));

        let err = Error::not_deletable(7, "protected");
        assert_eq!(err.to_string(), "object 7 cannot be deleted: protected");
    }

    #[test]
    fn test_error_schema_mismatch() {
        assert!(Error::unknown_field("x").is_schema_mismatch());
        assert!(Error::unknown_writing_system("qaa").is_schema_mismatch());
        assert!(!Error::not_found(1).is_schema_mismatch());
        assert!(!Error::TransactionClosed.is_schema_mismatch());
    }

    #[test]
    fn test_error_from_serde() {
        let parse: core::result::Result<u32, _> = serde_json::from_str("{not json");
        let err: Error = parse.unwrap_err().into();
        match err {
            Error::Descriptor(_) => {}
            other => panic!("Wrong error type: {other:?}"),
        }
    }
}
