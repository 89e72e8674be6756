//! Set status tool
//!
//! Completion of a task (status `done`) is gated by the domain: tasks with
//! incomplete prerequisites are rejected, and the rejection text flows back
//! to the model unchanged.

use super::{domain_outcome, parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::state_machine::state::SetStatusInput;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct SetStatusTool;

#[async_trait]
impl Tool for SetStatusTool {
    fn name(&self) -> &'static str {
        "set_status"
    }

    fn description(&self) -> String {
        "Move a task to a new status (open, in_progress, done). Marking a \
         task done fails while any of its prerequisites is not done."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["id", "status"],
            "properties": {
                "id": { "type": "string" },
                "status": {
                    "type": "string",
                    "enum": ["open", "in_progress", "done"]
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: SetStatusInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        let result = ctx
            .store()
            .set_status(&ctx.scope, &input.id, input.status)
            .await
            .map(|()| json!({ "id": input.id, "status": input.status }));
        domain_outcome(result)
    }
}
