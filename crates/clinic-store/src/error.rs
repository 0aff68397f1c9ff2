//! Error types for store operations
//!
//! Every store failure is reported as a distinct [`StoreError`] variant so that
//! callers can tell an unavailable store from a missing record or a violated
//! constraint. No operation falls back to a default value on failure.

use crate::value::Key;

/// Errors raised by store handles and seed sources
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Connection closed or never opened
    #[error("store '{store}' is unavailable")]
    Unavailable {
        /// Store name
        store: String,
    },

    /// Direct lookup or delete of a key that does not exist
    #[error("record {key} not found in store '{store}'")]
    NotFound {
        /// Store name
        store: String,
        /// Missing key
        key: Key,
    },

    /// Duplicate primary key or unique-indexed value
    #[error("constraint violation in '{store}': {field} = {value} already exists")]
    ConstraintViolation {
        /// Store name
        store: String,
        /// Key field or unique index field
        field: String,
        /// Offending value, rendered for display
        value: String,
    },

    /// Record carries no key and the store does not generate keys
    #[error("record has no '{key_field}' and store '{store}' does not generate keys")]
    MissingKey {
        /// Store name
        store: String,
        /// Expected key field
        key_field: String,
    },

    /// Generated keys would pass `i64::MAX`
    #[error("store '{store}' has no generated keys left")]
    KeySpaceExhausted {
        /// Store name
        store: String,
    },

    /// Index lookup on a field the schema does not index
    #[error("store '{store}' has no index on '{field}'")]
    UnknownIndex {
        /// Store name
        store: String,
        /// Requested field
        field: String,
    },

    /// Record or payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Seed data source could not be reached
    #[error("seed fetch failed for '{entity}': {message}")]
    TransientFetchFailure {
        /// Entity being fetched
        entity: String,
        /// Underlying failure
        message: String,
    },
}

impl StoreError {
    /// Create unavailable error for store
    pub fn unavailable(store: impl Into<String>) -> Self {
        Self::Unavailable {
            store: store.into(),
        }
    }

    /// Create not-found error for key
    pub fn not_found(store: impl Into<String>, key: Key) -> Self {
        Self::NotFound {
            store: store.into(),
            key,
        }
    }

    /// Create constraint violation for field/value pair
    pub fn constraint(
        store: impl Into<String>,
        field: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self::ConstraintViolation {
            store: store.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Create fetch failure for entity
    pub fn fetch_failed(entity: impl Into<String>, message: impl ToString) -> Self {
        Self::TransientFetchFailure {
            entity: entity.into(),
            message: message.to_string(),
        }
    }

    /// Check if error means the record is absent
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if retrying the triggering action may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::TransientFetchFailure { .. }
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::not_found("doctors", Key::Int(99));
        assert_eq!(err.to_string(), "record 99 not found in store 'doctors'");
        assert!(err.is_not_found());
    }

    #[test]
    fn constraint_display() {
        let err = StoreError::constraint("admins", "email", "a@clinic.test");
        assert_eq!(
            err.to_string(),
            "constraint violation in 'admins': email = a@clinic.test already exists"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn retryable_kinds() {
        assert!(StoreError::unavailable("patients").is_retryable());
        assert!(StoreError::fetch_failed("doctors", "timeout").is_retryable());
        assert!(!StoreError::Serialization("bad".to_string()).is_retryable());
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
