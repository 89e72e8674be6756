//! Task domain operation interface
//!
//! The session core consumes the task store through this narrow trait and
//! never implements domain rules itself. `memory::InMemoryTaskStore` is a
//! reference implementation backing the demo binary and the test suite;
//! production deployments plug in their own store.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolved identity/authorization context for domain operations.
///
/// Opaque to the session core: it is handed in by the caller and passed
/// through to every store call unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub user_id: String,
}

impl Scope {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

/// How urgently a task needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Repeat cadence for recurring tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

/// Fields for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.urgency.is_none()
            && self.due_date.is_none()
            && self.recurrence.is_none()
    }
}

/// Assignment target; the domain rejects setting both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Filter for listing tasks; `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assigned_user: Option<String>,
    #[serde(default)]
    pub assigned_group: Option<String>,
    #[serde(default)]
    pub due_before: Option<NaiveDate>,
}

/// Task snapshot returned by list operations and fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_group: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub prerequisites: Vec<String>,
}

/// Domain operation failure.
///
/// `Rejected` is a business-rule violation: the diagnostic is fed back to
/// the model verbatim and the session continues. `Unavailable` means the
/// collaborator itself is down, which ends the session.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("{0}")]
    Rejected(String),
    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// The task collaborator's operation interface.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task, returning its id.
    async fn create(&self, scope: &Scope, task: NewTask) -> Result<String, DomainError>;

    /// Apply a partial update to a task's descriptive fields.
    async fn update(&self, scope: &Scope, id: &str, changes: TaskChanges)
        -> Result<(), DomainError>;

    /// Move a task to a new status. Completing a task with incomplete
    /// prerequisites is rejected.
    async fn set_status(
        &self,
        scope: &Scope,
        id: &str,
        status: TaskStatus,
    ) -> Result<(), DomainError>;

    /// Assign a task to a user or a group (not both).
    async fn assign(
        &self,
        scope: &Scope,
        id: &str,
        assignment: Assignment,
    ) -> Result<(), DomainError>;

    /// Record that `blocked_id` cannot complete until `prerequisite_id` is done.
    async fn link_prerequisite(
        &self,
        scope: &Scope,
        blocked_id: &str,
        prerequisite_id: &str,
    ) -> Result<(), DomainError>;

    /// List tasks matching the filter.
    async fn list(&self, scope: &Scope, filter: TaskFilter)
        -> Result<Vec<TaskSummary>, DomainError>;
}
