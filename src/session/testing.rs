//! Mock inference backends for driver tests
//!
//! No real I/O: responses are scripted per request, and every request is
//! recorded for later inspection.

use crate::llm::{
    ContentBlock, InferenceBackend, InferenceError, InferenceRequest, InferenceResponse, Usage,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type ErrorFactory = Box<dyn Fn() -> InferenceError + Send + Sync>;

/// Scripted backend: returns queued responses in order, records requests.
///
/// When the queue runs dry it either calls the configured error factory
/// (see [`MockBackend::failing_with`]) or reports a missing script entry.
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<InferenceResponse, InferenceError>>>,
    fallback: Option<ErrorFactory>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose every request fails with a fresh error from `factory`
    /// (errors are not clonable, so they are minted per call).
    pub fn failing_with(factory: impl Fn() -> InferenceError + Send + Sync + 'static) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Some(Box::new(factory)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next scripted outcome.
    pub fn queue(&self, outcome: Result<InferenceResponse, InferenceError>) {
        self.responses.lock().unwrap().push_back(outcome);
    }

    /// Number of requests the driver has issued.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// All recorded requests, in order.
    pub fn recorded_requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn complete(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(outcome) = self.responses.lock().unwrap().pop_front() {
            return outcome;
        }
        match &self.fallback {
            Some(factory) => Err(factory()),
            None => Err(InferenceError::unknown("no scripted response left")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A scripted text-only response.
pub fn respond_text(text: &str) -> Result<InferenceResponse, InferenceError> {
    Ok(InferenceResponse {
        content: vec![ContentBlock::text(text)],
        usage: Usage::default(),
    })
}

/// A scripted response carrying the given tool uses, in order.
pub fn respond_tool_uses(
    uses: Vec<(&str, &str, serde_json::Value)>,
) -> Result<InferenceResponse, InferenceError> {
    Ok(InferenceResponse {
        content: uses
            .into_iter()
            .map(|(id, name, input)| ContentBlock::tool_use(id, name, input))
            .collect(),
        usage: Usage::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_come_back_in_order() {
        let mock = MockBackend::new();
        mock.queue(respond_text("first"));
        mock.queue(respond_text("second"));

        let request = InferenceRequest {
            system: String::new(),
            messages: vec![],
            tools: vec![],
            max_tokens: None,
        };

        let first = mock.complete(&request).await.unwrap();
        assert_eq!(first.text(), "first");
        let second = mock.complete(&request).await.unwrap();
        assert_eq!(second.text(), "second");

        // Queue exhausted without a fallback configured.
        let third = mock.complete(&request).await;
        assert!(third.is_err());
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn failing_backend_mints_fresh_errors() {
        let mock = MockBackend::failing_with(|| InferenceError::network("timeout"));
        let request = InferenceRequest {
            system: String::new(),
            messages: vec![],
            tools: vec![],
            max_tokens: None,
        };
        for _ in 0..3 {
            let err = mock.complete(&request).await.unwrap_err();
            assert!(err.kind.is_retryable());
        }
        assert_eq!(mock.request_count(), 3);
    }
}
