/// Authentication endpoints
///
/// Registration, login, token refresh, and the current-user probe.
///
/// Registration always produces a `viewer` account. There is no role field in
/// the payload at all; promotion goes through the admin-only role endpoint.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get token pair
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `GET /v1/auth/me` - Current user profile

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{authorization::Actor, jwt, password},
    models::user::{CreateUser, GlobalRole, User},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique login name
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    /// Optional email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Token pair response, shared by register and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// User ID
    pub user_id: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Registers a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "grace",
///   "email": "grace@example.com",
///   "password": "correct-horse-battery"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate().map_err(validation_error)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: GlobalRole::Viewer,
        },
    )
    .await?;

    issue_token_pair(&state, &user)
}

/// Logs a user in
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Bad credentials or inactive account; the two cases
///   are indistinguishable in the response
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    issue_token_pair(&state, &user)
}

/// Exchanges a refresh token for a new access token
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// ```
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Returns the current user's profile
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/me
/// Authorization: Bearer <access_token>
/// ```
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, actor.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

fn issue_token_pair(state: &AppState, user: &User) -> ApiResult<Json<TokenResponse>> {
    // Tokens carry identity only. The role is loaded fresh on every request,
    // so a role change or deactivation takes effect immediately.
    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(TokenResponse {
        user_id: user.id.to_string(),
        access_token,
        refresh_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            username: "ab".to_string(),
            email: None,
            password: "short".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_register_request_valid() {
        let req = RegisterRequest {
            username: "grace".to_string(),
            email: Some("grace@example.com".to_string()),
            password: "correct-horse-battery".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_payload_has_no_role_field() {
        // A client cannot smuggle a role into registration; the field does
        // not deserialize.
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "mallory",
            "password": "longenoughpassword",
            "role": "admin",
        }))
        .unwrap();
        assert_eq!(req.username, "mallory");
    }
}
