/// Notification endpoints
///
/// Notifications have no project dimension: visibility is recipient-only,
/// with the usual admin bypass. Anything visible is also mutable here, since
/// a recipient owns their own inbox. Foreign notification ids resolve to 404
/// without revealing whether they exist.
///
/// # Endpoints
///
/// - `GET /v1/notifications` - List own notifications (admins see all)
/// - `POST /v1/notifications` - Create a notification
/// - `GET /v1/notifications/:id` - Get notification
/// - `DELETE /v1/notifications/:id` - Delete notification
/// - `POST /v1/notifications/:id/read` - Mark read
/// - `POST /v1/notifications/:id/unread` - Mark unread

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
    auth::authorization::{Actor, Visibility},
    models::notification::{CreateNotification, Notification},
};
use uuid::Uuid;
use validator::Validate;

/// Notification creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    /// Recipient; omitted means the acting user. Only admins may address
    /// someone else.
    pub user_id: Option<Uuid>,

    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Longer body text
    #[serde(default)]
    pub message: String,
}

/// Lists the actor's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = Notification::list(&state.db, Visibility::for_actor(&actor)).await?;

    Ok(Json(notifications))
}

/// Creates a notification
///
/// # Errors
///
/// - `403 Forbidden`: Non-admin addressed another user
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_notification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    req.validate().map_err(validation_error)?;

    let recipient = req.user_id.unwrap_or(actor.user_id);
    if recipient != actor.user_id && !actor.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let notification = Notification::create(
        &state.db,
        CreateNotification {
            user_id: recipient,
            title: req.title,
            message: req.message,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

/// Gets a single notification
pub async fn get_notification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = fetch_visible(&state, &actor, id).await?;

    Ok(Json(notification))
}

/// Deletes a notification
///
/// Visibility is the whole check: a recipient may always clear their own
/// inbox, and an admin may clear anyone's.
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let notification = fetch_visible(&state, &actor, id).await?;

    Notification::delete(&state.db, notification.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Marks a notification as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    set_read_flag(&state, &actor, id, true).await
}

/// Marks a notification as unread
pub async fn mark_unread(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    set_read_flag(&state, &actor, id, false).await
}

async fn set_read_flag(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
    is_read: bool,
) -> ApiResult<Json<Notification>> {
    let notification = fetch_visible(state, actor, id).await?;

    let updated = Notification::set_read(&state.db, notification.id, is_read)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(updated))
}

async fn fetch_visible(state: &AppState, actor: &Actor, id: Uuid) -> ApiResult<Notification> {
    Notification::find_visible(&state.db, id, Visibility::for_actor(actor))
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_recipient_optional() {
        let req: CreateNotificationRequest = serde_json::from_value(serde_json::json!({
            "title": "Task assigned",
        }))
        .unwrap();
        assert!(req.user_id.is_none());
        assert!(req.message.is_empty());
    }

    #[test]
    fn test_create_request_rejects_empty_title() {
        let req = CreateNotificationRequest {
            user_id: None,
            title: String::new(),
            message: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
