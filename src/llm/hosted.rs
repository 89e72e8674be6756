//! Hosted inference API backend
//!
//! Remote endpoint reached over authenticated HTTPS with a bearer
//! credential. The wire format is a messages API: typed request out,
//! content blocks back, tool calls inline.

use super::types::{
    ContentBlock, InferenceRequest, InferenceResponse, Message, Role, ToolDefinition, Usage,
};
use super::{InferenceBackend, InferenceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.steward-inference.dev/v1/messages";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Hosted backend implementation
pub struct HostedBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    name: String,
}

impl HostedBackend {
    pub fn new(
        api_key: String,
        model: &str,
        base_url: Option<&str>,
        request_timeout: Duration,
    ) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            api_key,
            name: format!("hosted/{model}"),
            model: model.to_string(),
            base_url,
        }
    }

    fn translate_request(&self, request: &InferenceRequest) -> WireRequest {
        let messages: Vec<WireMessage> = request.messages.iter().map(translate_message).collect();

        let tools: Vec<WireTool> = request
            .tools
            .iter()
            .map(|t: &ToolDefinition| WireTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();

        WireRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.clone(),
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> InferenceError {
        match status.as_u16() {
            401 | 403 => InferenceError::auth(format!("authentication failed: {body}")),
            429 => InferenceError::rate_limit(format!("rate limited: {body}")),
            400 => InferenceError::invalid_request(format!("invalid request: {body}")),
            500..=599 => InferenceError::server_error(format!("server error: {body}")),
            _ => InferenceError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

/// Hosted wire roles are user/assistant; tool results travel inside a
/// user-role message, so a `Tool` message folds into `user` here.
fn translate_message(msg: &Message) -> WireMessage {
    let role = match msg.role {
        Role::User | Role::Tool => "user",
        Role::Model => "assistant",
    };

    let content: Vec<WireContentBlock> = msg
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => WireContentBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => WireContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => WireContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
        })
        .collect();

    WireMessage {
        role: role.to_string(),
        content,
    }
}

fn normalize_response(resp: WireResponse) -> InferenceResponse {
    let content: Vec<ContentBlock> = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            WireContentBlock::Text { text } => Some(ContentBlock::Text { text }),
            WireContentBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse { id, name, input })
            }
            // Tool results never appear in responses; drop rather than fail.
            WireContentBlock::ToolResult { .. } => None,
        })
        .collect();

    InferenceResponse {
        content,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}

#[async_trait]
impl InferenceBackend for HostedBackend {
    async fn complete(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let wire_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::network(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    InferenceError::network(format!("connection failed: {e}"))
                } else {
                    InferenceError::unknown(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let wire_response: WireResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::malformed(format!("unparseable response body: {e}")))?;

        Ok(normalize_response(wire_response))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: Vec<WireContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireContentBlock>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_messages_fold_into_user_role() {
        let msg = Message::tool_result("call-1", "created t-1", false);
        let wire = translate_message(&msg);
        assert_eq!(wire.role, "user");
        assert!(matches!(
            wire.content[0],
            WireContentBlock::ToolResult { .. }
        ));
    }

    #[test]
    fn normalize_drops_spurious_tool_results() {
        let resp = WireResponse {
            content: vec![
                WireContentBlock::Text {
                    text: "ok".to_string(),
                },
                WireContentBlock::ToolResult {
                    tool_use_id: "x".to_string(),
                    content: "should not be here".to_string(),
                    is_error: false,
                },
            ],
            usage: WireUsage::default(),
        };
        let normalized = normalize_response(resp);
        assert_eq!(normalized.content.len(), 1);
    }

    #[test]
    fn error_classification_by_status() {
        let auth = HostedBackend::classify_error(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(auth.kind, super::super::InferenceErrorKind::Auth);

        let rate = HostedBackend::classify_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow");
        assert_eq!(rate.kind, super::super::InferenceErrorKind::RateLimit);

        let server =
            HostedBackend::classify_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert_eq!(server.kind, super::super::InferenceErrorKind::ServerError);

        let bad = HostedBackend::classify_error(reqwest::StatusCode::BAD_REQUEST, "schema");
        assert_eq!(bad.kind, super::super::InferenceErrorKind::InvalidRequest);
    }

    #[test]
    fn request_omits_empty_tool_table() {
        let backend = HostedBackend::new(
            "key".to_string(),
            "steward-large",
            None,
            Duration::from_secs(5),
        );
        let request = InferenceRequest {
            system: "sys".to_string(),
            messages: vec![Message::user("hi")],
            tools: vec![],
            max_tokens: None,
        };
        let wire = backend.translate_request(&request);
        assert!(wire.tools.is_none());
        assert_eq!(wire.max_tokens, DEFAULT_MAX_TOKENS);
        let body = serde_json::to_value(&wire).expect("serializes");
        assert!(body.get("tools").is_none());
        assert_eq!(body["messages"][0]["role"], json!("user"));
    }
}
