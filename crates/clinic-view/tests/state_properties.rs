//! Property tests for the view lifecycle

use clinic_view::{allowed_transitions, validate_transition, ViewState};
use proptest::prelude::*;

fn any_state() -> impl Strategy<Value = ViewState> {
    prop_oneof![
        Just(ViewState::Unbound),
        Just(ViewState::Loading),
        Just(ViewState::Rendered),
    ]
}

proptest! {
    #[test]
    fn prop_validate_agrees_with_allowed(from in any_state(), to in any_state()) {
        prop_assert_eq!(
            validate_transition(from, to).is_ok(),
            allowed_transitions(from).contains(&to)
        );
    }

    #[test]
    fn prop_rendered_only_entered_from_loading(path in prop::collection::vec(any_state(), 1..20)) {
        let mut current = ViewState::Unbound;
        for next in path {
            if validate_transition(current, next).is_ok() {
                if next == ViewState::Rendered {
                    prop_assert_eq!(current, ViewState::Loading);
                }
                current = next;
            }
        }
    }

    #[test]
    fn prop_every_bound_state_can_tear_down(state in any_state()) {
        if state != ViewState::Unbound {
            prop_assert!(validate_transition(state, ViewState::Unbound).is_ok());
        }
    }
}
