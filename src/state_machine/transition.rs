//! Pure state transition function

use super::state::{SessionContext, SessionState, TerminalReason};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O
/// side effects. The driver owns all I/O and feeds outcomes back as events.
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Session start
        // ============================================================

        // Idle + Start -> Running round 1, ask the model
        (SessionState::Idle, Event::Start) => {
            Ok(TransitionResult::new(SessionState::Running { round: 1 })
                .with_effect(Effect::RequestModel))
        }

        // ============================================================
        // Model responses
        // ============================================================

        // Running + ModelMessage with tool calls -> execute them serially
        (SessionState::Running { round }, Event::ModelMessage { tool_calls })
            if !tool_calls.is_empty() =>
        {
            Ok(TransitionResult::new(SessionState::AwaitingToolResults {
                round: *round,
                pending: tool_calls.clone(),
            })
            .with_effect(Effect::execute_tools(tool_calls)))
        }

        // Running + text-only ModelMessage -> the round is spent with no
        // progress; re-prompt if budget remains, otherwise exhausted
        (SessionState::Running { round }, Event::ModelMessage { .. }) => {
            Ok(advance_round(*round, context))
        }

        // Running + unusable output -> same shape as a text-only round:
        // one round consumed, not fatal
        (SessionState::Running { round }, Event::ModelOutputUnusable) => {
            Ok(advance_round(*round, context))
        }

        // ============================================================
        // Tool execution outcomes
        // ============================================================

        // Completion signal succeeded. Checked before the budget so a
        // completion in the final round still completes.
        (
            SessionState::AwaitingToolResults { .. },
            Event::ToolsExecuted { completed: true },
        ) => Ok(TransitionResult::new(SessionState::Completed)
            .with_effect(Effect::finish(TerminalReason::Completed))),

        // Tools ran (ok or with recoverable errors) without completion
        (
            SessionState::AwaitingToolResults { round, .. },
            Event::ToolsExecuted { completed: false },
        ) => Ok(advance_round(*round, context)),

        // ============================================================
        // Unrecoverable errors
        // ============================================================

        (state, Event::Fatal { message, kind }) if !state.is_terminal() => {
            Ok(TransitionResult::new(SessionState::Failed {
                message: message.clone(),
                kind,
            })
            .with_effect(Effect::finish(TerminalReason::FatalError { message })))
        }

        // ============================================================
        // Everything else is a driver bug
        // ============================================================

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "no transition from {state:?} with event {event:?}"
        ))),
    }
}

/// A full exchange just finished in `round`. Either enter the next round
/// or exhaust the budget; those are the only two ways a non-terminal
/// round ends.
fn advance_round(round: u32, context: &SessionContext) -> TransitionResult {
    if round >= context.max_rounds {
        TransitionResult::new(SessionState::Exhausted)
            .with_effect(Effect::finish(TerminalReason::RoundBudgetExhausted))
    } else {
        TransitionResult::new(SessionState::Running { round: round + 1 })
            .with_effect(Effect::RequestModel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::state::{CompleteSessionInput, FailureKind, ToolCall, ToolInput};

    fn ctx(max_rounds: u32) -> SessionContext {
        SessionContext::new("test-session", max_rounds)
    }

    fn call(id: &str) -> ToolCall {
        ToolCall::new(
            id,
            ToolInput::CompleteSession(CompleteSessionInput::default()),
        )
    }

    #[test]
    fn start_enters_round_one() {
        let result = transition(&SessionState::Idle, &ctx(5), Event::Start).unwrap();
        assert_eq!(result.new_state, SessionState::Running { round: 1 });
        assert_eq!(result.effects, vec![Effect::RequestModel]);
    }

    #[test]
    fn tool_calls_move_to_awaiting_results() {
        let result = transition(
            &SessionState::Running { round: 2 },
            &ctx(5),
            Event::ModelMessage {
                tool_calls: vec![call("a"), call("b")],
            },
        )
        .unwrap();

        match &result.new_state {
            SessionState::AwaitingToolResults { round, pending } => {
                assert_eq!(*round, 2);
                assert_eq!(pending.len(), 2);
            }
            other => panic!("expected AwaitingToolResults, got {other:?}"),
        }
        assert!(matches!(result.effects[0], Effect::ExecuteTools { .. }));
    }

    #[test]
    fn text_only_round_consumes_budget() {
        let result = transition(
            &SessionState::Running { round: 1 },
            &ctx(5),
            Event::ModelMessage { tool_calls: vec![] },
        )
        .unwrap();
        assert_eq!(result.new_state, SessionState::Running { round: 2 });
        assert_eq!(result.effects, vec![Effect::RequestModel]);
    }

    #[test]
    fn text_only_final_round_exhausts() {
        let result = transition(
            &SessionState::Running { round: 5 },
            &ctx(5),
            Event::ModelMessage { tool_calls: vec![] },
        )
        .unwrap();
        assert_eq!(result.new_state, SessionState::Exhausted);
        assert_eq!(
            result.effects,
            vec![Effect::finish(TerminalReason::RoundBudgetExhausted)]
        );
    }

    #[test]
    fn unusable_output_consumes_a_round_without_failing() {
        let result = transition(
            &SessionState::Running { round: 3 },
            &ctx(5),
            Event::ModelOutputUnusable,
        )
        .unwrap();
        assert_eq!(result.new_state, SessionState::Running { round: 4 });
    }

    #[test]
    fn completion_signal_completes() {
        let state = SessionState::AwaitingToolResults {
            round: 2,
            pending: vec![call("a")],
        };
        let result = transition(&state, &ctx(5), Event::ToolsExecuted { completed: true }).unwrap();
        assert_eq!(result.new_state, SessionState::Completed);
        assert_eq!(
            result.effects,
            vec![Effect::finish(TerminalReason::Completed)]
        );
    }

    #[test]
    fn completion_in_final_round_beats_exhaustion() {
        let state = SessionState::AwaitingToolResults {
            round: 5,
            pending: vec![call("a")],
        };
        let result = transition(&state, &ctx(5), Event::ToolsExecuted { completed: true }).unwrap();
        assert_eq!(result.new_state, SessionState::Completed);
    }

    #[test]
    fn tools_without_completion_advance_or_exhaust() {
        let mid = SessionState::AwaitingToolResults {
            round: 2,
            pending: vec![call("a")],
        };
        let result = transition(&mid, &ctx(5), Event::ToolsExecuted { completed: false }).unwrap();
        assert_eq!(result.new_state, SessionState::Running { round: 3 });

        let last = SessionState::AwaitingToolResults {
            round: 5,
            pending: vec![call("a")],
        };
        let result = transition(&last, &ctx(5), Event::ToolsExecuted { completed: false }).unwrap();
        assert_eq!(result.new_state, SessionState::Exhausted);
    }

    #[test]
    fn fatal_fails_from_any_non_terminal_state() {
        for state in [
            SessionState::Idle,
            SessionState::Running { round: 1 },
            SessionState::AwaitingToolResults {
                round: 1,
                pending: vec![call("a")],
            },
        ] {
            let result = transition(
                &state,
                &ctx(5),
                Event::Fatal {
                    message: "backend credential rejected".to_string(),
                    kind: FailureKind::Auth,
                },
            )
            .unwrap();
            assert!(matches!(result.new_state, SessionState::Failed { .. }));
        }
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for state in [
            SessionState::Completed,
            SessionState::Exhausted,
            SessionState::Failed {
                message: "x".to_string(),
                kind: FailureKind::Network,
            },
        ] {
            let result = transition(&state, &ctx(5), Event::ModelMessage { tool_calls: vec![] });
            assert!(matches!(
                result,
                Err(TransitionError::InvalidTransition(_))
            ));
        }
    }
}
