//! Inference backend abstraction
//!
//! One request/response contract over two interchangeable backends: a
//! hosted inference API reached over authenticated HTTPS, and a local
//! inference server reached over plain HTTP.

mod error;
mod hosted;
mod local;
mod types;

pub use error::{InferenceError, InferenceErrorKind};
pub use hosted::HostedBackend;
pub use local::LocalBackend;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Common interface for inference backends
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send the conversation and tool schema, get the next model message.
    async fn complete(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError>;

    /// Identifier used in logs (backend kind + model).
    fn name(&self) -> &str;
}

/// Which backend a session talks to.
///
/// A closed set: selection happens once at session construction from
/// explicit configuration, never per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Hosted,
    Local,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hosted" | "remote" => Some(Self::Hosted),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Backend construction parameters.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    /// Bearer credential for the hosted backend. The local backend is
    /// unauthenticated and ignores this.
    pub api_key: Option<String>,
    /// Endpoint override; each backend has its own default.
    pub base_url: Option<String>,
    /// Per-attempt timeout for one inference request.
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            model: String::new(),
            api_key: None,
            base_url: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Build the configured backend, wrapped with request logging.
///
/// The hosted backend requires a credential up front; a missing key is an
/// auth error at construction time rather than on the first round.
pub fn backend_for(config: &BackendConfig) -> Result<Arc<dyn InferenceBackend>, InferenceError> {
    let inner: Arc<dyn InferenceBackend> = match config.kind {
        BackendKind::Hosted => {
            let api_key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    InferenceError::auth("hosted backend selected but no API key configured")
                })?;
            Arc::new(HostedBackend::new(
                api_key,
                &config.model,
                config.base_url.as_deref(),
                config.request_timeout,
            ))
        }
        BackendKind::Local => Arc::new(LocalBackend::new(
            &config.model,
            config.base_url.as_deref(),
            config.request_timeout,
        )),
    };
    Ok(Arc::new(LoggingBackend::new(inner)))
}

/// Logging wrapper for inference backends
pub struct LoggingBackend {
    inner: Arc<dyn InferenceBackend>,
    name: String,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn InferenceBackend>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl InferenceBackend for LoggingBackend {
    async fn complete(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    backend = %self.name,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    tool_calls = response.tool_uses().len(),
                    "inference request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    backend = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "inference request failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
