/// User administration endpoints
///
/// # Endpoints
///
/// - `PUT /v1/users/:id/role` - Change a user's platform-wide role (admin only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::authorization::Actor,
    models::user::{GlobalRole, User},
};
use uuid::Uuid;

/// Role change request
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    /// New platform-wide role
    pub role: GlobalRole,
}

/// Changes a user's platform-wide role
///
/// Admin only. The change takes effect on the target's next request because
/// roles are read from the database, not from the token.
///
/// # Endpoint
///
/// ```text
/// PUT /v1/users/:id/role
/// Content-Type: application/json
///
/// { "role": "collaborator" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Acting user is not an admin
/// - `404 Not Found`: No such user
pub async fn set_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<User>> {
    if !actor.role.can_manage_users() {
        return Err(ApiError::Forbidden);
    }

    let user = User::set_role(&state.db, user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        target_user = %user.id,
        new_role = user.role.as_str(),
        changed_by = %actor.user_id,
        "User role changed"
    );

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_role_request_parses() {
        let req: SetRoleRequest =
            serde_json::from_value(serde_json::json!({ "role": "admin" })).unwrap();
        assert_eq!(req.role, GlobalRole::Admin);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<SetRoleRequest, _> =
            serde_json::from_value(serde_json::json!({ "role": "superuser" }));
        assert!(result.is_err());
    }
}
