//! Link prerequisite tool

use super::{domain_outcome, parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::state_machine::state::LinkPrerequisiteInput;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct LinkPrerequisiteTool;

#[async_trait]
impl Tool for LinkPrerequisiteTool {
    fn name(&self) -> &'static str {
        "link_prerequisite"
    }

    fn description(&self) -> String {
        "Record that one task blocks another: blocked_id cannot be marked \
         done until prerequisite_id is done."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["blocked_id", "prerequisite_id"],
            "properties": {
                "blocked_id": {
                    "type": "string",
                    "description": "Task that is blocked"
                },
                "prerequisite_id": {
                    "type": "string",
                    "description": "Task that must be done first"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: LinkPrerequisiteInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        let result = ctx
            .store()
            .link_prerequisite(&ctx.scope, &input.blocked_id, &input.prerequisite_id)
            .await
            .map(|()| {
                json!({
                    "blocked": input.blocked_id,
                    "prerequisite": input.prerequisite_id
                })
            });
        domain_outcome(result)
    }
}
