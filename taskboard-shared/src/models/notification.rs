/// Notification model and database operations
///
/// A notification belongs to exactly one recipient. This is the one resource
/// with no project dimension: the visibility predicate is simply
/// `recipient == actor`, and admins see everything. Read-state toggles are
/// permitted to the recipient or an admin.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     message TEXT NOT NULL DEFAULT '',
///     is_read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::Visibility;

/// Notification for a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Short title
    pub title: String,

    /// Longer body text
    pub message: String,

    /// Whether the recipient has read it
    pub is_read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Recipient; the service defaults this to the acting user and only an
    /// admin may address someone else
    pub user_id: Uuid,

    pub title: String,

    #[serde(default)]
    pub message: String,
}

impl Notification {
    /// Creates a notification
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, message)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, message, is_read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.message)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Fetches a notification by ID through the visibility predicate
    ///
    /// Someone else's notification id comes back as `None`; the existence of
    /// foreign notifications is never revealed.
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Self>, sqlx::Error> {
        let notification = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Notification>(
                    "SELECT id, user_id, title, message, is_read, created_at \
                     FROM notifications WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            Visibility::User(user_id) => {
                sqlx::query_as::<_, Notification>(
                    "SELECT id, user_id, title, message, is_read, created_at \
                     FROM notifications WHERE id = $1 AND user_id = $2",
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(notification)
    }

    /// Lists visible notifications, newest first
    pub async fn list(pool: &PgPool, visibility: Visibility) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Notification>(
                    "SELECT id, user_id, title, message, is_read, created_at \
                     FROM notifications ORDER BY created_at DESC",
                )
                .fetch_all(pool)
                .await?
            }
            Visibility::User(user_id) => {
                sqlx::query_as::<_, Notification>(
                    "SELECT id, user_id, title, message, is_read, created_at \
                     FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(notifications)
    }

    /// Sets the read flag
    pub async fn set_read(
        pool: &PgPool,
        id: Uuid,
        is_read: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = $2
            WHERE id = $1
            RETURNING id, user_id, title, message, is_read, created_at
            "#,
        )
        .bind(id)
        .bind(is_read)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Deletes a notification
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a user's unread notifications
    ///
    /// Backed by the (user_id, is_read) index.
    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_notification_defaults_empty_message() {
        let data: CreateNotification = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "title": "Task assigned",
        }))
        .unwrap();
        assert!(data.message.is_empty());
    }
}
