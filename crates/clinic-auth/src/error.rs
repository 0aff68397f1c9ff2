//! Error types for authentication

use clinic_store::StoreError;

/// Errors from credential storage and login
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Username unknown or password wrong (deliberately indistinguishable)
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Account a login was requested for does not exist
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// Stored hash could not be parsed
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// Underlying store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Create malformed hash error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedHash(reason.into())
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Store(err) if err.is_retryable())
    }
}

/// Result type alias for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_outages_are_retryable() {
        assert!(AuthError::from(StoreError::unavailable("logins")).is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
        assert!(!AuthError::malformed("no separator").is_retryable());
    }
}
