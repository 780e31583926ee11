/// Comment mutation endpoints
///
/// Posting and listing live under `/v1/tasks/:id/comments`; this module holds
/// the mutations addressed by comment id. Editing and deleting are real
/// writes: the scope pairs the parent task's project with the comment's
/// author, so an author edits their own comment under the usual matrix and a
/// project collaborator can moderate others'.
///
/// # Endpoints
///
/// - `PUT /v1/comments/:id` - Edit a comment
/// - `DELETE /v1/comments/:id` - Delete a comment

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::authorization::{require_write, Actor, Visibility, WriteAction, WriteScope},
    models::{comment::Comment, task::Task},
};
use uuid::Uuid;
use validator::Validate;

/// Comment edit request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    /// New comment body
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

/// Edits a comment's content
///
/// The author is immutable. Authorization scope: the parent task's project,
/// with the comment's author as the creator.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate().map_err(validation_error)?;

    let (comment, scope) = fetch_with_scope(&state, &actor, id).await?;

    require_write(&state.db, &actor, WriteAction::Update, &scope).await?;

    let updated = Comment::update_content(&state.db, comment.id, req.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes a comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let (comment, scope) = fetch_with_scope(&state, &actor, id).await?;

    require_write(&state.db, &actor, WriteAction::Delete, &scope).await?;

    Comment::delete(&state.db, comment.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_with_scope(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
) -> ApiResult<(Comment, WriteScope)> {
    let comment = Comment::find_visible(&state.db, id, Visibility::for_actor(actor))
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    // Admin visibility bypasses the task predicate, so resolve the parent
    // without it.
    let task = Task::find_visible(&state.db, comment.task_id, Visibility::All)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let scope = WriteScope {
        project_id: task.project_id,
        created_by: comment.author_id,
    };

    Ok((comment, scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_rejects_empty_content() {
        let req = UpdateCommentRequest {
            content: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_ignores_author_field() {
        let req: UpdateCommentRequest = serde_json::from_value(serde_json::json!({
            "content": "edited",
            "author_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(req.content, "edited");
    }
}
