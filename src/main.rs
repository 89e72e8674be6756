//! steward - run one task-management session from the command line
//!
//! The seed prompt comes from the command line; configuration from
//! `STEWARD_*` environment variables. Tasks live in the bundled in-memory
//! store, so this binary is a demo of the session core, not a durable
//! task database.

use std::sync::Arc;
use std::time::Duration;

use steward::domain::memory::InMemoryTaskStore;
use steward::domain::TaskFilter;
use steward::llm::Role;
use steward::{
    backend_for, BackendConfig, BackendKind, ConversationDriver, RetryPolicy, Scope,
    SessionConfig, TaskStore, TerminalReason,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steward=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let seed_prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if seed_prompt.trim().is_empty() {
        eprintln!("usage: steward <seed prompt>");
        eprintln!("  e.g. steward \"create a task called 'Buy milk' then complete the session\"");
        std::process::exit(2);
    }

    // Configuration
    let kind = std::env::var("STEWARD_BACKEND")
        .ok()
        .and_then(|v| BackendKind::parse(&v))
        .unwrap_or_default();

    let backend_config = BackendConfig {
        kind,
        model: std::env::var("STEWARD_MODEL").unwrap_or_else(|_| match kind {
            BackendKind::Hosted => "steward-large".to_string(),
            BackendKind::Local => "qwen3".to_string(),
        }),
        api_key: std::env::var("STEWARD_API_KEY").ok(),
        base_url: std::env::var("STEWARD_BASE_URL").ok(),
        request_timeout: Duration::from_secs(env_parsed("STEWARD_TIMEOUT_SECS").unwrap_or(120)),
    };

    let session_config = SessionConfig {
        max_rounds: env_parsed("STEWARD_MAX_ROUNDS").unwrap_or(8),
        retry: RetryPolicy {
            attempts: env_parsed("STEWARD_RETRY_ATTEMPTS").unwrap_or(2),
            ..Default::default()
        },
        ..Default::default()
    };

    let backend = backend_for(&backend_config)?;
    tracing::info!(backend = %backend.name(), "backend resolved");

    let store = Arc::new(InMemoryTaskStore::new());
    let driver = ConversationDriver::new(backend, store.clone(), session_config);

    let scope = Scope::new(std::env::var("STEWARD_USER").unwrap_or_else(|_| "local".to_string()));
    let result = driver.run(scope.clone(), &seed_prompt).await;

    // Transcript to stdout for inspection.
    println!("session {} finished: {:?}", result.session_id, result.reason);
    println!("rounds used: {}", result.rounds_used);
    for message in &result.conversation {
        let role = match message.role {
            Role::User => "user",
            Role::Model => "model",
            Role::Tool => "tool",
        };
        println!("[{role}] {}", serde_json::to_string(&message.content)?);
    }

    let tasks = store.list(&scope, TaskFilter::default()).await?;
    println!("tasks after session: {}", serde_json::to_string_pretty(&tasks)?);

    match result.reason {
        TerminalReason::Completed => Ok(()),
        TerminalReason::RoundBudgetExhausted => {
            eprintln!("session ran out of rounds before completing");
            std::process::exit(3);
        }
        TerminalReason::FatalError { message } => {
            eprintln!("session failed: {message}");
            std::process::exit(1);
        }
    }
}
