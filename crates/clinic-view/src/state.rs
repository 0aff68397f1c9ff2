//! Bound view lifecycle
//!
//! ```text
//! Unbound → Loading → Rendered → Loading → Rendered → … → Unbound
//! ```
//!
//! There is no error state. A failed pass returns to `Rendered` and leaves the
//! last good output in place.

use crate::error::ViewError;

/// Lifecycle state of one bound view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewState {
    /// Not attached to a target
    #[default]
    Unbound,
    /// A pass is in flight
    Loading,
    /// Target shows the newest completed pass
    Rendered,
}

/// Validate a state transition
pub fn validate_transition(from: ViewState, to: ViewState) -> Result<(), ViewError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ViewError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: ViewState) -> Vec<ViewState> {
    use ViewState::{Loading, Rendered, Unbound};
    match from {
        Unbound => vec![Loading],
        // Loading → Loading: a newer pass supersedes the one in flight
        Loading => vec![Loading, Rendered, Unbound],
        Rendered => vec![Loading, Unbound],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_only_starts_loading() {
        assert!(validate_transition(ViewState::Unbound, ViewState::Loading).is_ok());
        assert!(validate_transition(ViewState::Unbound, ViewState::Rendered).is_err());
        assert!(validate_transition(ViewState::Unbound, ViewState::Unbound).is_err());
    }

    #[test]
    fn rendered_reloads_or_tears_down() {
        assert!(validate_transition(ViewState::Rendered, ViewState::Loading).is_ok());
        assert!(validate_transition(ViewState::Rendered, ViewState::Unbound).is_ok());
        assert!(validate_transition(ViewState::Rendered, ViewState::Rendered).is_err());
    }

    #[test]
    fn illegal_transition_reports_states() {
        let err = validate_transition(ViewState::Unbound, ViewState::Rendered).unwrap_err();
        assert_eq!(
            err,
            ViewError::IllegalTransition {
                from: ViewState::Unbound,
                to: ViewState::Rendered
            }
        );
    }
}
