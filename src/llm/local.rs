//! Local inference server backend
//!
//! Talks to a locally-hosted inference server over unauthenticated HTTP
//! (Ollama-compatible `/api/chat`). The server is assumed to be already
//! running and health-checked by an external process.

use super::types::{ContentBlock, InferenceRequest, InferenceResponse, Message, Role, Usage};
use super::{InferenceBackend, InferenceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Local backend implementation
pub struct LocalBackend {
    client: Client,
    model: String,
    chat_url: String,
    name: String,
}

impl LocalBackend {
    pub fn new(model: &str, base_url: Option<&str>, request_timeout: Duration) -> Self {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            name: format!("local/{model}"),
            model: model.to_string(),
            chat_url: format!("{base}/api/chat"),
        }
    }

    fn translate_request(&self, request: &InferenceRequest) -> WireRequest {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: request.system.clone(),
            tool_calls: None,
        }];
        messages.extend(request.messages.iter().map(translate_message));

        let tools: Vec<WireTool> = request
            .tools
            .iter()
            .map(|t| WireTool {
                kind: "function".to_string(),
                function: WireFunctionDef {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect();

        WireRequest {
            model: self.model.clone(),
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            stream: false,
        }
    }
}

/// The local wire format carries tool calls as function-call entries on an
/// assistant message and tool results as `tool`-role messages with plain
/// string content.
fn translate_message(msg: &Message) -> WireMessage {
    match msg.role {
        Role::User => WireMessage {
            role: "user".to_string(),
            content: msg.text(),
            tool_calls: None,
        },
        Role::Model => {
            let calls: Vec<WireToolCall> = msg
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { name, input, .. } => Some(WireToolCall {
                        function: WireFunctionCall {
                            name: name.clone(),
                            arguments: input.clone(),
                        },
                    }),
                    _ => None,
                })
                .collect();
            WireMessage {
                role: "assistant".to_string(),
                content: msg.text(),
                tool_calls: if calls.is_empty() { None } else { Some(calls) },
            }
        }
        Role::Tool => {
            let content = msg
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("");
            WireMessage {
                role: "tool".to_string(),
                content,
                tool_calls: None,
            }
        }
    }
}

/// The local protocol carries no correlation ids; synthesize one per call
/// so pairing with tool results works the same as on the hosted path.
fn normalize_response(resp: WireResponse) -> InferenceResponse {
    let mut content = Vec::new();

    if !resp.message.content.is_empty() {
        content.push(ContentBlock::text(resp.message.content));
    }

    for call in resp.message.tool_calls.unwrap_or_default() {
        content.push(ContentBlock::tool_use(
            uuid::Uuid::new_v4().to_string(),
            call.function.name,
            call.function.arguments,
        ));
    }

    InferenceResponse {
        content,
        usage: Usage {
            input_tokens: resp.prompt_eval_count.unwrap_or(0),
            output_tokens: resp.eval_count.unwrap_or(0),
        },
    }
}

#[async_trait]
impl InferenceBackend for LocalBackend {
    async fn complete(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let wire_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.chat_url)
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::network(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    InferenceError::network(format!("local inference server unreachable: {e}"))
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
            return Err(match status.as_u16() {
                404 => InferenceError::invalid_request(format!("model not loaded: {body}")),
                500..=599 => InferenceError::server_error(format!("server error: {body}")),
                _ => InferenceError::unknown(format!("HTTP {status}: {body}")),
            });
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
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    message: WireMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}
