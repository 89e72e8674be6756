//! Completion signal tool
//!
//! The one reserved tool whose successful execution ends the session. It
//! performs no domain call; the driver watches for it when collecting the
//! round's results.

use super::{parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::state_machine::state::CompleteSessionInput;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct CompleteSessionTool;

#[async_trait]
impl Tool for CompleteSessionTool {
    fn name(&self) -> &'static str {
        "complete_session"
    }

    fn description(&self) -> String {
        "End the session. Call this once the user's request has been \
         carried out (or cannot be). Optionally include a short summary of \
         what was done."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "One or two sentences on the outcome"
                }
            }
        })
    }

    async fn run(&self, input: Value, _ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: CompleteSessionInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        Ok(ToolOutput::success(
            input.summary.unwrap_or_else(|| "session completed".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memory::InMemoryTaskStore;
    use crate::domain::Scope;
    use std::sync::Arc;

    fn test_context() -> ToolContext {
        ToolContext::new(Scope::new("test-user"), Arc::new(InMemoryTaskStore::new()))
    }

    #[tokio::test]
    async fn succeeds_without_arguments() {
        let result = CompleteSessionTool
            .run(json!({}), &test_context())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "session completed");
    }

    #[tokio::test]
    async fn echoes_the_summary() {
        let result = CompleteSessionTool
            .run(json!({"summary": "created 2 tasks"}), &test_context())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "created 2 tasks");
    }
}
