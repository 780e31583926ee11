/// Task endpoints
///
/// Tasks inherit visibility from their parent project, plus an own-creation
/// disjunct. Creating a task requires write access to the parent project;
/// commenting only requires seeing the task.
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List visible tasks (optional `?project_id=` filter)
/// - `POST /v1/tasks` - Create task in a writable project
/// - `GET /v1/tasks/:id` - Get task
/// - `PUT /v1/tasks/:id` - Update task
/// - `DELETE /v1/tasks/:id` - Delete task
/// - `GET /v1/tasks/:id/comments` - List comments, oldest first
/// - `POST /v1/tasks/:id/comments` - Post a comment

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::authorization::{require_write, Actor, Visibility, WriteAction, WriteScope},
    models::{
        comment::Comment,
        project::Project,
        task::{CreateTask, Task, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Parent project
    pub project_id: Uuid,

    /// Task name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Optional assigned user
    pub assignee: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<chrono::NaiveDate>,
}

/// Query parameters for task listing
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Restrict to one project
    pub project_id: Option<Uuid>,
}

/// Comment creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Comment body
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

/// Lists tasks visible to the actor, newest first
///
/// With `?project_id=`, a filter on a hidden project simply yields an empty
/// list; the predicate already excludes its tasks.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list(&state.db, Visibility::for_actor(&actor), query.project_id).await?;

    Ok(Json(tasks))
}

/// Creates a task in a project
///
/// The parent project must be visible (404 otherwise) and writable (403
/// otherwise). The task's creator is forced to the actor.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_error)?;

    let project = Project::find_visible(&state.db, req.project_id, Visibility::for_actor(&actor))
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    // Creation relates the actor to the project, not to a task that does not
    // exist yet.
    let scope = WriteScope {
        project_id: project.id,
        created_by: project.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Create, &scope).await?;

    let task = Task::create(
        &state.db,
        actor.user_id,
        CreateTask {
            project_id: req.project_id,
            name: req.name,
            description: req.description,
            assignee: req.assignee,
            due_date: req.due_date,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %task.project_id, created_by = %actor.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Gets a single task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = fetch_visible(&state, &actor, id).await?;

    Ok(Json(task))
}

/// Updates a task's mutable fields
///
/// The parent project reference is immutable; the patch type has no field
/// for it. Status changes go through the same matrix as any other field.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = fetch_visible(&state, &actor, id).await?;

    if let Some(name) = &patch.name {
        if name.is_empty() || name.len() > 255 {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "name".to_string(),
                message: "Name must be 1-255 characters".to_string(),
            }]));
        }
    }

    let scope = WriteScope {
        project_id: task.project_id,
        created_by: task.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Update, &scope).await?;

    let updated = Task::update(&state.db, id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes a task and its comments
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = fetch_visible(&state, &actor, id).await?;

    let scope = WriteScope {
        project_id: task.project_id,
        created_by: task.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Delete, &scope).await?;

    Task::delete(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a task's comments, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let task = fetch_visible(&state, &actor, id).await?;

    let comments = Comment::list_for_task(&state.db, task.id).await?;

    Ok(Json(comments))
}

/// Posts a comment on a task
///
/// Read-adjacent: anyone who can see the task may comment, including pure
/// viewers. The write matrix is not consulted.
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate().map_err(validation_error)?;

    let task = fetch_visible(&state, &actor, id).await?;

    let comment = Comment::create(&state.db, task.id, actor.user_id, req.content).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn fetch_visible(state: &AppState, actor: &Actor, id: Uuid) -> ApiResult<Task> {
    Task::find_visible(&state.db, id, Visibility::for_actor(actor))
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_request_validation() {
        let req = CreateTaskRequest {
            project_id: Uuid::new_v4(),
            name: String::new(),
            description: String::new(),
            assignee: None,
            due_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_comment_request_rejects_empty_content() {
        let req = CreateCommentRequest {
            content: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListTasksQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(query.project_id.is_none());
    }
}
