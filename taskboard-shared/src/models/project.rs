/// Project model and database operations
///
/// A project is owned by exactly one creator (immutable after creation) and
/// carries a set of memberships. Non-admin reads go through the visibility
/// predicate: a user sees a project only if they created it or hold a
/// membership on it, and the filter is applied in the query itself.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     start_date DATE,
///     end_date DATE,
///     status project_status NOT NULL DEFAULT 'pending',
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

/// Project lifecycle status
///
/// No transition graph is enforced: any authorized writer may set any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Optional planned start
    pub start_date: Option<NaiveDate>,

    /// Optional planned end
    pub end_date: Option<NaiveDate>,

    /// Current status
    pub status: ProjectStatus,

    /// Creating user; immutable after creation
    pub created_by: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
///
/// `created_by` is not part of the payload: it is always forced to the
/// acting user server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

/// Input for updating a project
///
/// Only non-None fields are written. `id` and `created_by` have no fields
/// here, so client-supplied values for them are discarded by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,

    pub description: Option<String>,

    /// An explicit `null` clears; an absent field leaves it unchanged
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub start_date: Option<Option<NaiveDate>>,

    /// An explicit `null` clears; an absent field leaves it unchanged
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub end_date: Option<Option<NaiveDate>>,

    pub status: Option<ProjectStatus>,
}

const PROJECT_COLUMNS: &str =
    "id, name, description, start_date, end_date, status, created_by, created_at, updated_at";

impl Project {
    /// Creates a new project owned by `created_by`
    pub async fn create(
        pool: &PgPool,
        created_by: Uuid,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, start_date, end_date, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, start_date, end_date, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Fetches a project by ID through the visibility predicate
    ///
    /// A project the actor may not see comes back as `None`, identical to a
    /// project that does not exist.
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Project>(&format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            Visibility::User(user_id) => {
                sqlx::query_as::<_, Project>(&format!(
                    r#"
                    SELECT {PROJECT_COLUMNS} FROM projects
                    WHERE id = $1
                      AND (created_by = $2 OR EXISTS (
                          SELECT 1 FROM project_memberships m
                          WHERE m.project_id = projects.id AND m.user_id = $2
                      ))
                    "#
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(project)
    }

    /// Lists visible projects, newest first
    pub async fn list(pool: &PgPool, visibility: Visibility) -> Result<Vec<Self>, sqlx::Error> {
        let projects = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Project>(&format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
                ))
                .fetch_all(pool)
                .await?
            }
            Visibility::User(user_id) => {
                sqlx::query_as::<_, Project>(&format!(
                    r#"
                    SELECT {PROJECT_COLUMNS} FROM projects
                    WHERE created_by = $1 OR EXISTS (
                        SELECT 1 FROM project_memberships m
                        WHERE m.project_id = projects.id AND m.user_id = $1
                    )
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(projects)
    }

    /// Updates a project's mutable fields
    ///
    /// Only non-None fields are written; `updated_at` is always refreshed.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.end_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_date = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {PROJECT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Deletes a project; tasks, comments, and memberships cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
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
        assert_eq!(ProjectStatus::Pending.as_str(), "pending");
        assert_eq!(ProjectStatus::InProgress.as_str(), "in_progress");
        assert_eq!(ProjectStatus::Completed.as_str(), "completed");
        assert_eq!(ProjectStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
        let back: ProjectStatus = serde_json::from_str(r#""cancelled""#).unwrap();
        assert_eq!(back, ProjectStatus::Cancelled);
    }

    #[test]
    fn test_null_dates_request_clearing() {
        let patch: UpdateProject =
            serde_json::from_value(serde_json::json!({ "end_date": null })).unwrap();
        assert_eq!(patch.end_date, Some(None));
        assert!(patch.start_date.is_none());
    }

    #[test]
    fn test_create_project_payload_has_no_creator_field() {
        // created_by is forced server-side; a client-supplied value must not
        // even deserialize into the payload.
        let data: CreateProject = serde_json::from_value(serde_json::json!({
            "name": "Apollo",
            "created_by": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(data.name, "Apollo");
        assert!(data.description.is_empty());
    }
}
