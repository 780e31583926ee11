/// Task model and database operations
///
/// A task belongs to exactly one project and is removed with it. The project
/// reference is immutable after creation: the update struct simply has no
/// field for it. Visibility derives from the parent project's memberships,
/// with one extra disjunct: a task's creator always sees their own task even
/// without a membership row on the project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'pending',
///     assignee UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::Visibility;

/// Task status
///
/// Like project status, free-form: any authorized writer may set any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Parent project; immutable after creation
    pub project_id: Uuid,

    /// Task name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Optional assigned user
    pub assignee: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Creating user; immutable after creation
    pub created_by: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// `created_by` is forced to the acting user server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Parent project
    pub project_id: Uuid,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub assignee: Option<Uuid>,

    pub due_date: Option<NaiveDate>,
}

/// Input for updating a task
///
/// No `project_id` or `created_by` fields: both are immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    /// An explicit `null` unassigns; an absent field leaves it unchanged
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub assignee: Option<Option<Uuid>>,

    /// An explicit `null` clears; an absent field leaves it unchanged
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

const TASK_COLUMNS: &str = "id, project_id, name, description, status, assignee, due_date, \
                            created_by, created_at, updated_at";

/// Visibility disjuncts for task rows, parameterized on the user bind
pub(crate) fn task_visible_clause(bind: &str) -> String {
    format!(
        "(tasks.created_by = {bind} \
         OR EXISTS (SELECT 1 FROM projects p \
                    WHERE p.id = tasks.project_id AND p.created_by = {bind}) \
         OR EXISTS (SELECT 1 FROM project_memberships m \
                    WHERE m.project_id = tasks.project_id AND m.user_id = {bind}))"
    )
}

impl Task {
    /// Creates a new task in a project
    ///
    /// Authorization against the parent project happens in the caller; this
    /// only persists the row.
    pub async fn create(
        pool: &PgPool,
        created_by: Uuid,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, name, description, assignee, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, name, description, status, assignee, due_date,
                      created_by, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.assignee)
        .bind(data.due_date)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Fetches a task by ID through the visibility predicate
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            Visibility::User(user_id) => {
                let clause = task_visible_clause("$2");
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND {clause}"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(task)
    }

    /// Lists visible tasks, newest first, optionally restricted to a project
    pub async fn list(
        pool: &PgPool,
        visibility: Visibility,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = match (visibility, project_id) {
            (Visibility::All, None) => {
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"
                ))
                .fetch_all(pool)
                .await?
            }
            (Visibility::All, Some(project)) => {
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 \
                     ORDER BY created_at DESC"
                ))
                .bind(project)
                .fetch_all(pool)
                .await?
            }
            (Visibility::User(user_id), None) => {
                let clause = task_visible_clause("$1");
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE {clause} ORDER BY created_at DESC"
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
            (Visibility::User(user_id), Some(project)) => {
                let clause = task_visible_clause("$1");
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks \
                     WHERE project_id = $2 AND {clause} ORDER BY created_at DESC"
                ))
                .bind(user_id)
                .bind(project)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(tasks)
    }

    /// Updates a task's mutable fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.assignee.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(assignee) = data.assignee {
            q = q.bind(assignee);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task; comments cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_visible_clause_includes_creator_disjunct() {
        // A task's creator keeps visibility of their own creation even with
        // no membership on the project.
        let clause = task_visible_clause("$1");
        assert!(clause.contains("tasks.created_by = $1"));
        assert!(clause.contains("project_memberships"));
        assert!(clause.contains("p.created_by = $1"));
    }

    #[test]
    fn test_null_assignee_requests_unassign() {
        // An explicit null must survive as Some(None) so the update builder
        // writes NULL; an absent field must stay None and leave the column
        // untouched.
        let patch: UpdateTask =
            serde_json::from_value(serde_json::json!({ "assignee": null })).unwrap();
        assert_eq!(patch.assignee, Some(None));
        assert!(patch.due_date.is_none());

        let patch: UpdateTask =
            serde_json::from_value(serde_json::json!({ "due_date": null })).unwrap();
        assert_eq!(patch.due_date, Some(None));
        assert!(patch.assignee.is_none());
    }

    #[test]
    fn test_update_task_has_no_project_field() {
        // project_id is immutable; a client-supplied value is dropped on
        // deserialization rather than rejected.
        let patch: UpdateTask = serde_json::from_value(serde_json::json!({
            "name": "renamed",
            "project_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(patch.name.as_deref(), Some("renamed"));
    }
}
