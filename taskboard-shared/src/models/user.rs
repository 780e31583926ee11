/// User model and database operations
///
/// Users carry a single platform-wide role that is the default authority
/// level for every permission check. Self-registration always produces a
/// `viewer`; only an admin may change a role afterwards, and the role field
/// is deliberately absent from the self-service update struct.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE global_role AS ENUM ('admin', 'collaborator', 'viewer');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     email VARCHAR(255) UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role global_role NOT NULL DEFAULT 'viewer',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Platform-wide authority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "global_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    /// Full access: bypasses all membership checks for all resources
    Admin,

    /// Can create projects and write to projects they created or hold a
    /// collaborator membership on
    Collaborator,

    /// Read-only access to data they are a member of
    Viewer,
}

impl GlobalRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "admin",
            GlobalRole::Collaborator => "collaborator",
            GlobalRole::Viewer => "viewer",
        }
    }

    /// Whether this role may create new projects
    pub fn can_create_projects(&self) -> bool {
        !matches!(self, GlobalRole::Viewer)
    }

    /// Whether this role may change other users' roles
    pub fn can_manage_users(&self) -> bool {
        matches!(self, GlobalRole::Admin)
    }
}

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique login name
    pub username: String,

    /// Optional email address, unique when present
    pub email: Option<String>,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Platform-wide role
    pub role: GlobalRole,

    /// Inactive accounts cannot authenticate
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Unique login name
    pub username: String,

    /// Optional email address
    pub email: Option<String>,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Role to assign (registration always passes Viewer)
    #[serde(default = "default_role")]
    pub role: GlobalRole,
}

fn default_role() -> GlobalRole {
    GlobalRole::Viewer
}

/// Input for self-service profile updates
///
/// Intentionally has no `role` or `is_active` field: those are admin-only
/// operations with their own methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New email address; an explicit `null` clears it
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub email: Option<Option<String>>,

    /// New password hash
    pub password_hash: Option<String>,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email already exists (unique
    /// constraint violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates a user's own profile fields
    ///
    /// Only non-None fields are updated; `updated_at` is always refreshed.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, username, email, password_hash, role, is_active, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email_opt) = data.email {
            q = q.bind(email_opt);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Sets a user's platform-wide role
    ///
    /// Caller is responsible for verifying the acting user is an admin; this
    /// is the one mutation that is not reachable through self-service update.
    pub async fn set_role(
        pool: &PgPool,
        id: Uuid,
        role: GlobalRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, role, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Memberships, created projects and tasks, comments, and notifications
    /// cascade with the row.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_role_as_str() {
        assert_eq!(GlobalRole::Admin.as_str(), "admin");
        assert_eq!(GlobalRole::Collaborator.as_str(), "collaborator");
        assert_eq!(GlobalRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_role_capabilities() {
        assert!(GlobalRole::Admin.can_create_projects());
        assert!(GlobalRole::Collaborator.can_create_projects());
        assert!(!GlobalRole::Viewer.can_create_projects());

        assert!(GlobalRole::Admin.can_manage_users());
        assert!(!GlobalRole::Collaborator.can_manage_users());
        assert!(!GlobalRole::Viewer.can_manage_users());
    }

    #[test]
    fn test_create_user_default_role() {
        assert_eq!(default_role(), GlobalRole::Viewer);
    }

    #[test]
    fn test_null_email_requests_clearing() {
        let patch: UpdateUser =
            serde_json::from_value(serde_json::json!({ "email": null })).unwrap();
        assert_eq!(patch.email, Some(None));
        assert!(patch.password_hash.is_none());
    }

    #[test]
    fn test_update_user_has_no_role_field() {
        // Compile-time shape check: the self-service update struct only
        // exposes email and password.
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
    }
}
