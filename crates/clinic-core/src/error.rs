//! Error types for the clinic registry

use clinic_auth::AuthError;
use clinic_store::StoreError;
use clinic_view::ViewError;

/// Umbrella error for clinic operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClinicError {
    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// View failure
    #[error("view error: {0}")]
    View(#[from] ViewError),

    /// Login or credential failure
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),
}

impl ClinicError {
    /// Create config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClinicError::Store(err) | ClinicError::View(ViewError::Store(err)) => {
                err.is_retryable()
            }
            ClinicError::Auth(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for ClinicError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for clinic operations
pub type ClinicResult<T> = Result<T, ClinicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_through_wrappers() {
        let outage = StoreError::unavailable("patients");
        assert!(ClinicError::from(outage.clone()).is_retryable());
        assert!(ClinicError::from(ViewError::from(outage.clone())).is_retryable());
        assert!(ClinicError::from(AuthError::from(outage)).is_retryable());
        assert!(!ClinicError::config("bad").is_retryable());
    }
}
