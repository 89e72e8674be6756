//! In-memory reference task store
//!
//! Backs the demo binary and the test suite. Tasks are partitioned by
//! scope; all validation rules the session core depends on (prerequisite
//! gating, user-xor-group assignment) live here, mirroring what a real
//! store enforces.

use super::{
    Assignment, DomainError, NewTask, Scope, TaskChanges, TaskFilter, TaskStatus, TaskStore,
    TaskSummary, Urgency,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct TaskRecord {
    id: String,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    urgency: Urgency,
    due_date: Option<NaiveDate>,
    recurrence: Option<super::Recurrence>,
    assigned_user: Option<String>,
    assigned_group: Option<String>,
    prerequisites: Vec<String>,
}

impl TaskRecord {
    fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            urgency: self.urgency,
            description: self.description.clone(),
            due_date: self.due_date,
            recurrence: self.recurrence,
            assigned_user: self.assigned_user.clone(),
            assigned_group: self.assigned_group.clone(),
            prerequisites: self.prerequisites.clone(),
        }
    }
}

#[derive(Default)]
struct ScopedTasks {
    tasks: HashMap<String, TaskRecord>,
    insertion_order: Vec<String>,
    next_id: u64,
}

/// Reference `TaskStore` with mutex-serialized state.
#[derive(Default)]
pub struct InMemoryTaskStore {
    scopes: Mutex<HashMap<String, ScopedTasks>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_scope<T>(
        &self,
        scope: &Scope,
        f: impl FnOnce(&mut ScopedTasks) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut scopes = self
            .scopes
            .lock()
            .map_err(|e| DomainError::Unavailable(format!("store lock poisoned: {e}")))?;
        let entry = scopes.entry(scope.user_id.clone()).or_default();
        f(entry)
    }
}

/// Depth-first check: would making `prerequisite` block `blocked` create a
/// dependency cycle?
fn creates_cycle(tasks: &HashMap<String, TaskRecord>, blocked: &str, prerequisite: &str) -> bool {
    let mut stack = vec![prerequisite.to_string()];
    let mut seen = Vec::new();
    while let Some(current) = stack.pop() {
        if current == blocked {
            return true;
        }
        if seen.contains(&current) {
            continue;
        }
        if let Some(record) = tasks.get(&current) {
            stack.extend(record.prerequisites.iter().cloned());
        }
        seen.push(current);
    }
    false
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, scope: &Scope, task: NewTask) -> Result<String, DomainError> {
        if task.title.trim().is_empty() {
            return Err(DomainError::rejected("task title must not be empty"));
        }
        self.with_scope(scope, |scoped| {
            scoped.next_id += 1;
            let id = format!("t-{}", scoped.next_id);
            let record = TaskRecord {
                id: id.clone(),
                title: task.title.trim().to_string(),
                description: task.description,
                status: TaskStatus::Open,
                urgency: task.urgency.unwrap_or_default(),
                due_date: task.due_date,
                recurrence: task.recurrence,
                assigned_user: None,
                assigned_group: None,
                prerequisites: Vec::new(),
            };
            scoped.tasks.insert(id.clone(), record);
            scoped.insertion_order.push(id.clone());
            Ok(id)
        })
    }

    async fn update(
        &self,
        scope: &Scope,
        id: &str,
        changes: TaskChanges,
    ) -> Result<(), DomainError> {
        if changes.is_empty() {
            return Err(DomainError::rejected("update contains no changes"));
        }
        self.with_scope(scope, |scoped| {
            let record = scoped
                .tasks
                .get_mut(id)
                .ok_or_else(|| DomainError::rejected(format!("no such task: {id}")))?;
            if let Some(title) = changes.title {
                if title.trim().is_empty() {
                    return Err(DomainError::rejected("task title must not be empty"));
                }
                record.title = title.trim().to_string();
            }
            if let Some(description) = changes.description {
                record.description = Some(description);
            }
            if let Some(urgency) = changes.urgency {
                record.urgency = urgency;
            }
            if let Some(due_date) = changes.due_date {
                record.due_date = Some(due_date);
            }
            if let Some(recurrence) = changes.recurrence {
                record.recurrence = Some(recurrence);
            }
            Ok(())
        })
    }

    async fn set_status(
        &self,
        scope: &Scope,
        id: &str,
        status: TaskStatus,
    ) -> Result<(), DomainError> {
        self.with_scope(scope, |scoped| {
            let record = scoped
                .tasks
                .get(id)
                .ok_or_else(|| DomainError::rejected(format!("no such task: {id}")))?;

            if status == TaskStatus::Done {
                let incomplete: Vec<&str> = record
                    .prerequisites
                    .iter()
                    .filter(|p| {
                        scoped
                            .tasks
                            .get(p.as_str())
                            .is_some_and(|t| t.status != TaskStatus::Done)
                    })
                    .map(String::as_str)
                    .collect();
                if !incomplete.is_empty() {
                    return Err(DomainError::rejected(format!(
                        "cannot complete: has incomplete prerequisites ({})",
                        incomplete.join(", ")
                    )));
                }
            }

            // Re-borrow mutably after the prerequisite check.
            if let Some(record) = scoped.tasks.get_mut(id) {
                record.status = status;
            }
            Ok(())
        })
    }

    async fn assign(
        &self,
        scope: &Scope,
        id: &str,
        assignment: Assignment,
    ) -> Result<(), DomainError> {
        if assignment.user_id.is_some() && assignment.group_id.is_some() {
            return Err(DomainError::rejected(
                "cannot assign to both a user and a group",
            ));
        }
        if assignment.user_id.is_none() && assignment.group_id.is_none() {
            return Err(DomainError::rejected(
                "assignment requires a user or a group",
            ));
        }
        self.with_scope(scope, |scoped| {
            let record = scoped
                .tasks
                .get_mut(id)
                .ok_or_else(|| DomainError::rejected(format!("no such task: {id}")))?;
            record.assigned_user = assignment.user_id;
            record.assigned_group = assignment.group_id;
            Ok(())
        })
    }

    async fn link_prerequisite(
        &self,
        scope: &Scope,
        blocked_id: &str,
        prerequisite_id: &str,
    ) -> Result<(), DomainError> {
        if blocked_id == prerequisite_id {
            return Err(DomainError::rejected(
                "a task cannot be its own prerequisite",
            ));
        }
        self.with_scope(scope, |scoped| {
            if !scoped.tasks.contains_key(blocked_id) {
                return Err(DomainError::rejected(format!("no such task: {blocked_id}")));
            }
            if !scoped.tasks.contains_key(prerequisite_id) {
                return Err(DomainError::rejected(format!(
                    "no such task: {prerequisite_id}"
                )));
            }
            if creates_cycle(&scoped.tasks, blocked_id, prerequisite_id) {
                return Err(DomainError::rejected(
                    "prerequisite link would create a dependency cycle",
                ));
            }
            // contains_key checked above; borrow is safe to take now
            if let Some(record) = scoped.tasks.get_mut(blocked_id) {
                if !record.prerequisites.iter().any(|p| p == prerequisite_id) {
                    record.prerequisites.push(prerequisite_id.to_string());
                }
            }
            Ok(())
        })
    }

    async fn list(
        &self,
        scope: &Scope,
        filter: TaskFilter,
    ) -> Result<Vec<TaskSummary>, DomainError> {
        self.with_scope(scope, |scoped| {
            let summaries = scoped
                .insertion_order
                .iter()
                .filter_map(|id| scoped.tasks.get(id))
                .filter(|t| filter.status.is_none_or(|s| t.status == s))
                .filter(|t| {
                    filter
                        .assigned_user
                        .as_ref()
                        .is_none_or(|u| t.assigned_user.as_deref() == Some(u.as_str()))
                })
                .filter(|t| {
                    filter
                        .assigned_group
                        .as_ref()
                        .is_none_or(|g| t.assigned_group.as_deref() == Some(g.as_str()))
                })
                .filter(|t| {
                    filter
                        .due_before
                        .is_none_or(|cutoff| t.due_date.is_some_and(|due| due < cutoff))
                })
                .map(TaskRecord::summary)
                .collect();
            Ok(summaries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new("user-1")
    }

    fn titled(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let store = InMemoryTaskStore::new();
        let id = store.create(&scope(), titled("Buy milk")).await.unwrap();
        assert_eq!(id, "t-1");

        let tasks = store.list(&scope(), TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(tasks[0].status, TaskStatus::Open);
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = InMemoryTaskStore::new();
        store.create(&scope(), titled("mine")).await.unwrap();

        let other = Scope::new("user-2");
        let tasks = store.list(&other, TaskFilter::default()).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn incomplete_prerequisite_blocks_completion() {
        let store = InMemoryTaskStore::new();
        let prereq = store.create(&scope(), titled("buy flour")).await.unwrap();
        let blocked = store.create(&scope(), titled("bake bread")).await.unwrap();
        store
            .link_prerequisite(&scope(), &blocked, &prereq)
            .await
            .unwrap();

        let err = store
            .set_status(&scope(), &blocked, TaskStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected(_)));
        assert!(err.to_string().contains("incomplete prerequisites"));

        store
            .set_status(&scope(), &prereq, TaskStatus::Done)
            .await
            .unwrap();
        store
            .set_status(&scope(), &blocked, TaskStatus::Done)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn assignment_is_user_xor_group() {
        let store = InMemoryTaskStore::new();
        let id = store.create(&scope(), titled("review PR")).await.unwrap();

        let both = Assignment {
            user_id: Some("alice".to_string()),
            group_id: Some("platform".to_string()),
        };
        let err = store.assign(&scope(), &id, both).await.unwrap_err();
        assert!(err.to_string().contains("both a user and a group"));

        let user_only = Assignment {
            user_id: Some("alice".to_string()),
            group_id: None,
        };
        store.assign(&scope(), &id, user_only).await.unwrap();

        let tasks = store.list(&scope(), TaskFilter::default()).await.unwrap();
        assert_eq!(tasks[0].assigned_user.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn cycles_are_rejected() {
        let store = InMemoryTaskStore::new();
        let a = store.create(&scope(), titled("a")).await.unwrap();
        let b = store.create(&scope(), titled("b")).await.unwrap();
        let c = store.create(&scope(), titled("c")).await.unwrap();

        store.link_prerequisite(&scope(), &b, &a).await.unwrap();
        store.link_prerequisite(&scope(), &c, &b).await.unwrap();

        let err = store.link_prerequisite(&scope(), &a, &c).await.unwrap_err();
        assert!(err.to_string().contains("cycle"));

        let err = store.link_prerequisite(&scope(), &a, &a).await.unwrap_err();
        assert!(err.to_string().contains("own prerequisite"));
    }

    #[tokio::test]
    async fn list_filters_compose() {
        let store = InMemoryTaskStore::new();
        let a = store.create(&scope(), titled("a")).await.unwrap();
        let _b = store.create(&scope(), titled("b")).await.unwrap();

        store
            .set_status(&scope(), &a, TaskStatus::Done)
            .await
            .unwrap();

        let done = store
            .list(
                &scope(),
                TaskFilter {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a);
    }

    #[tokio::test]
    async fn update_rejects_unknown_task_and_empty_changes() {
        let store = InMemoryTaskStore::new();
        let err = store
            .update(&scope(), "t-99", TaskChanges::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no changes"));

        let changes = TaskChanges {
            urgency: Some(Urgency::High),
            ..Default::default()
        };
        let err = store.update(&scope(), "t-99", changes).await.unwrap_err();
        assert!(err.to_string().contains("no such task"));
    }
}
