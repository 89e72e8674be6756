//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_tool_input() -> impl Strategy<Value = ToolInput> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(|title| ToolInput::CreateTask(CreateTaskInput {
            title,
            description: None,
            urgency: None,
            due_date: None,
            recurrence: None,
        })),
        "t-[0-9]{1,3}".prop_map(|id| ToolInput::SetStatus(SetStatusInput {
            id,
            status: crate::domain::TaskStatus::Done,
        })),
        Just(ToolInput::ListTasks(ListTasksInput::default())),
        Just(ToolInput::CompleteSession(CompleteSessionInput::default())),
        ("[a-z_]{1,12}", Just(serde_json::json!({}))).prop_map(|(name, input)| {
            ToolInput::Unknown { name, input }
        }),
    ]
}

fn arb_tool_call() -> impl Strategy<Value = ToolCall> {
    ("[a-z0-9]{8}", arb_tool_input()).prop_map(|(id, input)| ToolCall::new(id, input))
}

fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::Network),
        Just(FailureKind::Auth),
        Just(FailureKind::Protocol),
        Just(FailureKind::Domain),
        Just(FailureKind::Internal),
    ]
}

fn arb_non_terminal_state(max_rounds: u32) -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        (1..=max_rounds).prop_map(|round| SessionState::Running { round }),
        (
            1..=max_rounds,
            proptest::collection::vec(arb_tool_call(), 1..4)
        )
            .prop_map(|(round, pending)| SessionState::AwaitingToolResults { round, pending }),
    ]
}

fn arb_terminal_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Completed),
        Just(SessionState::Exhausted),
        ("[a-z ]{1,20}", arb_failure_kind())
            .prop_map(|(message, kind)| SessionState::Failed { message, kind }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        proptest::collection::vec(arb_tool_call(), 0..4)
            .prop_map(|tool_calls| Event::ModelMessage { tool_calls }),
        Just(Event::ModelOutputUnusable),
        any::<bool>().prop_map(|completed| Event::ToolsExecuted { completed }),
        ("[a-z ]{1,20}", arb_failure_kind())
            .prop_map(|(message, kind)| Event::Fatal { message, kind }),
    ]
}

const MAX_ROUNDS: u32 = 6;

fn ctx() -> SessionContext {
    SessionContext::new("prop-session", MAX_ROUNDS)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Terminal states never transition, whatever the event.
    #[test]
    fn terminal_states_are_absorbing(state in arb_terminal_state(), event in arb_event()) {
        prop_assert!(transition(&state, &ctx(), event).is_err());
    }

    /// Fatal events end any non-terminal state in Failed with a Finish effect.
    #[test]
    fn fatal_always_fails(
        state in arb_non_terminal_state(MAX_ROUNDS),
        message in "[a-z ]{1,30}",
        kind in arb_failure_kind(),
    ) {
        let result = transition(&state, &ctx(), Event::Fatal { message: message.clone(), kind })
            .expect("fatal must be accepted from non-terminal states");
        prop_assert!(
            matches!(result.new_state, SessionState::Failed { .. }),
            "expected Failed state"
        );
        prop_assert!(
            result.effects.iter().any(|e| matches!(e, Effect::Finish { .. })),
            "expected a Finish effect"
        );
    }

    /// The round counter never decreases and never exceeds the budget.
    #[test]
    fn rounds_are_monotonic_and_bounded(
        round in 1..=MAX_ROUNDS,
        tool_calls in proptest::collection::vec(arb_tool_call(), 0..4),
    ) {
        let state = SessionState::Running { round };
        if let Ok(result) = transition(&state, &ctx(), Event::ModelMessage { tool_calls }) {
            if let Some(next_round) = result.new_state.round() {
                prop_assert!(next_round >= round);
                prop_assert!(next_round <= MAX_ROUNDS);
            }
        }
    }

    /// A finished exchange in the final round always exhausts (absent completion).
    #[test]
    fn final_round_without_completion_exhausts(
        pending in proptest::collection::vec(arb_tool_call(), 1..4),
    ) {
        let state = SessionState::AwaitingToolResults { round: MAX_ROUNDS, pending };
        let result = transition(&state, &ctx(), Event::ToolsExecuted { completed: false })
            .expect("tool completion is accepted while awaiting results");
        prop_assert_eq!(result.new_state, SessionState::Exhausted);
    }

    /// A successful completion signal completes regardless of the round.
    #[test]
    fn completion_wins_in_any_round(
        round in 1..=MAX_ROUNDS,
        pending in proptest::collection::vec(arb_tool_call(), 1..4),
    ) {
        let state = SessionState::AwaitingToolResults { round, pending };
        let result = transition(&state, &ctx(), Event::ToolsExecuted { completed: true })
            .expect("tool completion is accepted while awaiting results");
        prop_assert_eq!(result.new_state, SessionState::Completed);
    }

    /// Every accepted transition out of a non-terminal state produces at
    /// least one effect driving the loop forward.
    #[test]
    fn transitions_always_drive_the_loop(
        state in arb_non_terminal_state(MAX_ROUNDS),
        event in arb_event(),
    ) {
        if let Ok(result) = transition(&state, &ctx(), event) {
            prop_assert!(!result.effects.is_empty());
        }
    }

    /// Tool input round-trips through its JSON value representation.
    #[test]
    fn tool_input_value_round_trip(input in arb_tool_input()) {
        let name = input.tool_name().to_string();
        let value = input.to_value();
        let reparsed = ToolInput::from_name_and_value(&name, value);
        // Unknown inputs stay unknown; typed inputs must survive unchanged.
        if !matches!(input, ToolInput::Unknown { .. }) {
            prop_assert_eq!(reparsed, input);
        }
    }
}
