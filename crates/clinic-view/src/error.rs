//! Error types for the view layer

use crate::state::ViewState;
use clinic_store::StoreError;

/// Errors surfaced by bound views
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    /// Underlying store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// State machine violation
    #[error("illegal view transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: ViewState,
        /// Requested state
        to: ViewState,
    },

    /// Operation on a view that has been torn down
    #[error("view '{0}' is not bound")]
    Unbound(String),
}

/// Result type alias for view operations
pub type ViewResult<T> = Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_conversion() {
        let err: ViewError = StoreError::unavailable("patients").into();
        assert!(matches!(err, ViewError::Store(StoreError::Unavailable { .. })));
        assert_eq!(err.to_string(), "store error: store 'patients' is unavailable");
    }

    #[test]
    fn unbound_display() {
        let err = ViewError::Unbound("doctorSelect".to_string());
        assert_eq!(err.to_string(), "view 'doctorSelect' is not bound");
    }
}
