/// Comment model and database operations
///
/// A comment belongs to one task and inherits visibility from it, with one
/// extra disjunct: an author always sees their own comment. The author is
/// immutable; only the content can change. Threads list oldest-first for
/// natural reading order.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::Visibility;
use crate::models::task::task_visible_clause;

/// Comment on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Authoring user; immutable
    pub author_id: Uuid,

    /// Comment body
    pub content: String,

    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// Visibility disjuncts for comment rows: own comments, or comments on a
/// visible task
fn comment_visible_clause(bind: &str) -> String {
    let task_clause = task_visible_clause(bind);
    format!(
        "(comments.author_id = {bind} \
         OR EXISTS (SELECT 1 FROM tasks \
                    WHERE tasks.id = comments.task_id AND {task_clause}))"
    )
}

impl Comment {
    /// Posts a comment on a task
    ///
    /// The caller verifies the actor can see the task; commenting is a
    /// read-adjacent action, open to every visible-task member.
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, content, created_at
            "#,
        )
        .bind(task_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Fetches a comment by ID through the visibility predicate
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Comment>(
                    "SELECT id, task_id, author_id, content, created_at \
                     FROM comments WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            Visibility::User(user_id) => {
                let clause = comment_visible_clause("$2");
                sqlx::query_as::<_, Comment>(&format!(
                    "SELECT id, task_id, author_id, content, created_at \
                     FROM comments WHERE id = $1 AND {clause}"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(comment)
    }

    /// Lists a task's comments, oldest first
    ///
    /// The caller has already resolved the task through its own visibility
    /// predicate, so no further filtering is needed here.
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Updates a comment's content
    pub async fn update_content(
        pool: &PgPool,
        id: Uuid,
        content: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $2
            WHERE id = $1
            RETURNING id, task_id, author_id, content, created_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Deletes a comment
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
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
    fn test_visible_clause_includes_author_disjunct() {
        let clause = comment_visible_clause("$2");
        assert!(clause.contains("comments.author_id = $2"));
        assert!(clause.contains("comments.task_id"));
    }
}
