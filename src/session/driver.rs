//! Conversation driver: the round loop
//!
//! Owns one session at a time: sends the conversation to the inference
//! backend, validates the reply into typed tool calls, runs them serially
//! against the task domain, and lets the pure state machine decide whether
//! the session continues, completes, fails, or exhausts its budget.

use super::{SessionConfig, SessionResult};
use crate::domain::{Scope, TaskStore};
use crate::llm::{InferenceBackend, InferenceErrorKind, InferenceRequest, Message, Role};
use crate::state_machine::{
    transition, Effect, Event, FailureKind, SessionContext, SessionState, TerminalReason, ToolCall,
    ToolInput,
};
use crate::tools::{ToolContext, ToolRegistry};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are a task management assistant. You manage the user's work items by \
calling the provided tools: create, update and list tasks, change their \
status, assign them, and link prerequisites between them. Carry out the \
user's request step by step, reacting to each tool result. When the \
request has been fully handled (or cannot be), call complete_session with \
a short summary. Do not answer with plain text alone.";

/// Appended when the model replies with text but no tool call, so the next
/// request differs from the last and idle chatter still burns the budget.
const NUDGE: &str = "\
Continue with the user's request using the available tools. When you are \
done, call complete_session.";

/// Drives sessions against one backend, tool registry and task store.
///
/// Construction resolves all collaborators once; `run` can be called for
/// any number of sequential sessions.
pub struct ConversationDriver {
    backend: Arc<dyn InferenceBackend>,
    tools: ToolRegistry,
    store: Arc<dyn TaskStore>,
    config: SessionConfig,
}

impl ConversationDriver {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        store: Arc<dyn TaskStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            backend,
            tools: ToolRegistry::standard(),
            store,
            config,
        }
    }

    /// Run one session to its terminal state.
    ///
    /// Never returns an error and never panics: every failure mode folds
    /// into the `SessionResult`'s terminal reason.
    pub async fn run(&self, scope: Scope, seed_prompt: &str) -> SessionResult {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(session_id.clone(), self.config.max_rounds.max(1));
        let tool_ctx = ToolContext::new(scope, Arc::clone(&self.store));

        tracing::info!(
            session_id = %session_id,
            backend = %self.backend.name(),
            max_rounds = context.max_rounds,
            "session started"
        );

        let mut conversation = vec![Message::user(seed_prompt)];
        let mut state = SessionState::Idle;
        let mut rounds_used: u32 = 0;
        let mut event = Event::Start;

        let reason = loop {
            let result = match transition(&state, &context, event) {
                Ok(r) => r,
                Err(e) => {
                    // A rejected transition is a driver bug, not a model
                    // mistake; end the session rather than loop forever.
                    tracing::error!(session_id = %session_id, error = %e, "transition rejected");
                    let message = e.to_string();
                    state = SessionState::Failed {
                        message: message.clone(),
                        kind: FailureKind::Internal,
                    };
                    break TerminalReason::FatalError { message };
                }
            };
            state = result.new_state;

            let mut next_event = None;
            let mut finish = None;
            for effect in result.effects {
                match effect {
                    Effect::RequestModel => {
                        next_event = Some(self.request_model(&mut conversation).await);
                    }
                    Effect::ExecuteTools { calls } => {
                        next_event =
                            Some(self.execute_tools(&calls, &mut conversation, &tool_ctx).await);
                    }
                    Effect::Finish { reason } => finish = Some(reason),
                }
            }

            if let Some(reason) = finish {
                break reason;
            }

            event = match next_event {
                Some(evt) => {
                    if ends_round(&evt) {
                        rounds_used += 1;
                    }
                    evt
                }
                None => {
                    // Only reachable if a transition produced no effect,
                    // which the state machine tests rule out.
                    let message = "state machine produced no follow-up effect".to_string();
                    state = SessionState::Failed {
                        message: message.clone(),
                        kind: FailureKind::Internal,
                    };
                    break TerminalReason::FatalError { message };
                }
            };
        };

        tracing::info!(
            session_id = %session_id,
            rounds_used,
            reason = ?reason,
            "session finished"
        );

        SessionResult {
            session_id,
            state,
            reason,
            conversation,
            rounds_used,
        }
    }

    /// One inference exchange, with per-request retries for transient
    /// failures. Returns the event describing the outcome.
    async fn request_model(&self, conversation: &mut Vec<Message>) -> Event {
        // Re-prompt after a text-only model turn; otherwise consecutive
        // requests would be byte-identical.
        if conversation.last().is_some_and(|m| m.role == Role::Model) {
            conversation.push(Message::user(NUDGE));
        }

        let request = InferenceRequest {
            system: SYSTEM_PROMPT.to_string(),
            messages: conversation.clone(),
            tools: self.tools.definitions(),
            max_tokens: Some(self.config.max_tokens),
        };

        let mut attempt: u32 = 0;
        let outcome = loop {
            match self.backend.complete(&request).await {
                Ok(response) => break Ok(response),
                Err(e) if e.kind.is_retryable() && attempt < self.config.retry.attempts => {
                    attempt += 1;
                    let delay = self.config.retry.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.retry.attempts,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "transient backend error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => break Err(e),
            }
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                return match e.kind {
                    InferenceErrorKind::MalformedResponse => {
                        tracing::warn!(error = %e, "unusable model output, round consumed");
                        Event::ModelOutputUnusable
                    }
                    InferenceErrorKind::Auth => Event::Fatal {
                        message: format!("backend authentication failed: {e}"),
                        kind: FailureKind::Auth,
                    },
                    InferenceErrorKind::Network
                    | InferenceErrorKind::RateLimit
                    | InferenceErrorKind::ServerError => Event::Fatal {
                        message: format!(
                            "transient backend failure persisted after {} attempt(s): {e}",
                            attempt + 1
                        ),
                        kind: FailureKind::Network,
                    },
                    InferenceErrorKind::InvalidRequest => Event::Fatal {
                        message: format!("backend rejected the request: {e}"),
                        kind: FailureKind::Protocol,
                    },
                    InferenceErrorKind::Unknown => Event::Fatal {
                        message: format!("backend request failed: {e}"),
                        kind: FailureKind::Internal,
                    },
                };
            }
        };

        if response.is_unusable() {
            tracing::warn!("model returned neither text nor tool calls, round consumed");
            return Event::ModelOutputUnusable;
        }

        // Validate into the fixed tool name set immediately; everything
        // downstream works with typed calls.
        let tool_calls: Vec<ToolCall> = response
            .tool_uses()
            .into_iter()
            .map(|(id, name, input)| {
                ToolCall::new(id, ToolInput::from_name_and_value(name, input.clone()))
            })
            .collect();

        conversation.push(Message::model(response.content.clone()));
        Event::ModelMessage { tool_calls }
    }

    /// Execute the round's tool calls serially, in emission order (later
    /// calls may depend on state mutated by earlier ones). Every call is
    /// answered before the loop returns.
    async fn execute_tools(
        &self,
        calls: &[ToolCall],
        conversation: &mut Vec<Message>,
        tool_ctx: &ToolContext,
    ) -> Event {
        let mut completed = false;

        for (index, call) in calls.iter().enumerate() {
            match self.tools.execute(call, tool_ctx).await {
                Ok(output) => {
                    tracing::info!(
                        tool = call.name(),
                        tool_use_id = %call.id,
                        ok = output.success,
                        "tool executed"
                    );
                    if call.input.is_completion_signal() && output.success {
                        completed = true;
                    }
                    conversation.push(Message::tool_result(
                        call.id.clone(),
                        output.output,
                        !output.success,
                    ));
                }
                Err(fatal) => {
                    tracing::error!(
                        tool = call.name(),
                        tool_use_id = %call.id,
                        error = %fatal,
                        "task store unreachable"
                    );
                    // Answer the failing call and the rest of the round so
                    // no call is ever left without a result.
                    conversation.push(Message::tool_result(
                        call.id.clone(),
                        fatal.to_string(),
                        true,
                    ));
                    for skipped in &calls[index + 1..] {
                        conversation.push(Message::tool_result(
                            skipped.id.clone(),
                            "skipped: session ended by an earlier fatal error",
                            true,
                        ));
                    }
                    return Event::Fatal {
                        message: fatal.to_string(),
                        kind: FailureKind::Domain,
                    };
                }
            }
        }

        Event::ToolsExecuted { completed }
    }
}

/// A round ends when its tools have all been executed, or when the model
/// produced no tool call at all (text-only or unusable output).
fn ends_round(event: &Event) -> bool {
    match event {
        Event::ToolsExecuted { .. } | Event::ModelOutputUnusable => true,
        Event::ModelMessage { tool_calls } => tool_calls.is_empty(),
        _ => false,
    }
}
