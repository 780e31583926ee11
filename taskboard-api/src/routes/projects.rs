/// Project endpoints
///
/// All reads go through the visibility predicate, so a project the actor may
/// not see yields 404 on every route here, never 403. Writes resolve the
/// object first (404 for hidden rows), then consult the write matrix (403 for
/// visible rows the actor may not touch).
///
/// # Endpoints
///
/// - `GET /v1/projects` - List visible projects
/// - `POST /v1/projects` - Create project (admin or collaborator)
/// - `GET /v1/projects/:id` - Get project
/// - `PUT /v1/projects/:id` - Update project
/// - `DELETE /v1/projects/:id` - Delete project
/// - `GET /v1/projects/:id/memberships` - List memberships
/// - `PUT /v1/projects/:id/memberships` - Assign or change a membership
/// - `DELETE /v1/projects/:id/memberships/:user_id` - Remove a membership

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
    auth::authorization::{
        can_create_project, require_write, Actor, Visibility, WriteAction, WriteScope,
    },
    models::{
        membership::{AssignMembership, ProjectMembership},
        project::{CreateProject, Project, UpdateProject},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Optional planned start
    pub start_date: Option<chrono::NaiveDate>,

    /// Optional planned end
    pub end_date: Option<chrono::NaiveDate>,
}

/// Lists projects visible to the actor, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list(&state.db, Visibility::for_actor(&actor)).await?;

    Ok(Json(projects))
}

/// Creates a project owned by the actor
///
/// The only write that is gated purely on global role: there is no project
/// to relate to yet. Viewers are denied; the creator field is forced to the
/// actor regardless of payload.
///
/// # Errors
///
/// - `403 Forbidden`: Actor is a viewer
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    if !can_create_project(actor.role) {
        return Err(ApiError::Forbidden);
    }

    req.validate().map_err(validation_error)?;

    let project = Project::create(
        &state.db,
        actor.user_id,
        CreateProject {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, created_by = %actor.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// Gets a single project
///
/// # Errors
///
/// - `404 Not Found`: Absent or not visible to the actor
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = Project::find_visible(&state.db, id, Visibility::for_actor(&actor))
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Updates a project's mutable fields
///
/// Status changes ride through the same matrix as any other update. The
/// creator field is immutable: the patch type has no field for it.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateProject>,
) -> ApiResult<Json<Project>> {
    let project = fetch_visible(&state, &actor, id).await?;

    if let Some(name) = &patch.name {
        if name.is_empty() || name.len() > 255 {
            return Err(ApiError::ValidationError(vec![
                crate::error::ValidationErrorDetail {
                    field: "name".to_string(),
                    message: "Name must be 1-255 characters".to_string(),
                },
            ]));
        }
    }

    let scope = WriteScope {
        project_id: project.id,
        created_by: project.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Update, &scope).await?;

    let updated = Project::update(&state.db, id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes a project and everything under it
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let project = fetch_visible(&state, &actor, id).await?;

    let scope = WriteScope {
        project_id: project.id,
        created_by: project.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Delete, &scope).await?;

    Project::delete(&state.db, id).await?;

    tracing::info!(project_id = %id, deleted_by = %actor.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a project's memberships
///
/// Reading the member list only requires seeing the project.
pub async fn list_memberships(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectMembership>>> {
    let project = fetch_visible(&state, &actor, id).await?;

    let memberships = ProjectMembership::list_for_project(&state.db, project.id).await?;

    Ok(Json(memberships))
}

/// Assigns a user to the project, or changes their role in place
///
/// Idempotent: assigning a role the user already holds is a no-op, assigning
/// a different one replaces it. Managing memberships is a write on the
/// project.
pub async fn set_membership(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignMembership>,
) -> ApiResult<Json<ProjectMembership>> {
    let project = fetch_visible(&state, &actor, id).await?;

    let scope = WriteScope {
        project_id: project.id,
        created_by: project.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Update, &scope).await?;

    let membership = ProjectMembership::assign(&state.db, project.id, req).await?;

    Ok(Json(membership))
}

/// Removes a user from the project
pub async fn remove_membership(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let project = fetch_visible(&state, &actor, id).await?;

    let scope = WriteScope {
        project_id: project.id,
        created_by: project.created_by,
    };
    require_write(&state.db, &actor, WriteAction::Update, &scope).await?;

    let removed = ProjectMembership::remove(&state.db, project.id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Membership not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_visible(state: &AppState, actor: &Actor, id: Uuid) -> ApiResult<Project> {
    Project::find_visible(&state.db, id, Visibility::for_actor(actor))
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_request_validation() {
        let req = CreateProjectRequest {
            name: String::new(),
            description: String::new(),
            start_date: None,
            end_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_project_request_ignores_creator() {
        let req: CreateProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Apollo",
            "created_by": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(req.name, "Apollo");
    }
}
