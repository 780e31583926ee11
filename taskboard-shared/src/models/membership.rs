/// Project membership model and database operations
///
/// A membership links a user to a project with a project-specific role. It is
/// the authorization-relevant join: write checks and visibility predicates
/// consult this table directly on every evaluation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('collaborator', 'viewer');
///
/// CREATE TABLE project_memberships (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'viewer',
///     assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// Assignment is an idempotent upsert: assigning a role to a user who already
/// holds one on the project updates the role in place, so there is never more
/// than one row per (project, user).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Per-project authority level
///
/// Can be more restrictive than the holder's global role, never less: a
/// global collaborator with a `Viewer` membership cannot write to that
/// project through the membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Can write to the project's resources (subject to global role)
    Collaborator,

    /// Read-only member
    Viewer,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Collaborator => "collaborator",
            ProjectRole::Viewer => "viewer",
        }
    }
}

/// Membership row linking a user to a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMembership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the assignment was made or last changed
    pub assigned_at: DateTime<Utc>,
}

/// Input for assigning a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignMembership {
    /// User to assign
    pub user_id: Uuid,

    /// Role to assign (defaults to Viewer)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Viewer
}

impl ProjectMembership {
    /// Assigns a user to a project, updating the role in place if the user
    /// is already a member
    ///
    /// Single atomic statement, so concurrent assignments for the same
    /// (project, user) pair cannot produce a duplicate row.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or user does not exist (foreign key
    /// violation) or the database connection fails.
    pub async fn assign(
        pool: &PgPool,
        project_id: Uuid,
        data: AssignMembership,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, ProjectMembership>(
            r#"
            INSERT INTO project_memberships (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id)
            DO UPDATE SET role = EXCLUDED.role, assigned_at = NOW()
            RETURNING project_id, user_id, role, assigned_at
            "#,
        )
        .bind(project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, ProjectMembership>(
            r#"
            SELECT project_id, user_id, role, assigned_at
            FROM project_memberships
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role on a project, if they are a member
    pub async fn role_for(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_memberships
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Removes a user from a project
    ///
    /// Returns true if a membership was removed, false if none existed.
    pub async fn remove(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_memberships WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all memberships of a project, oldest assignment first
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, ProjectMembership>(
            r#"
            SELECT project_id, user_id, role, assigned_at
            FROM project_memberships
            WHERE project_id = $1
            ORDER BY assigned_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists all memberships held by a user
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, ProjectMembership>(
            r#"
            SELECT project_id, user_id, role, assigned_at
            FROM project_memberships
            WHERE user_id = $1
            ORDER BY assigned_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_role_as_str() {
        assert_eq!(ProjectRole::Collaborator.as_str(), "collaborator");
        assert_eq!(ProjectRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_assign_membership_default_role() {
        assert_eq!(default_role(), ProjectRole::Viewer);
    }

    #[test]
    fn test_assign_membership_deserializes_without_role() {
        let data: AssignMembership =
            serde_json::from_value(serde_json::json!({ "user_id": Uuid::new_v4() })).unwrap();
        assert_eq!(data.role, ProjectRole::Viewer);
    }
}
