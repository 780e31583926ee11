/// Error handling for the API server
///
/// A unified error type that maps to HTTP responses. Handlers return
/// `Result<T, ApiError>` which converts to the right status code.
///
/// Two policies from the access-control design are enforced here:
/// - `Forbidden` carries no reason text: denial is opaque.
/// - An object hidden by the visibility filter surfaces as `NotFound`,
///   indistinguishable from a row that does not exist.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401) - missing or invalid credential
    Unauthorized(String),

    /// Forbidden (403) - authorization denial, deliberately reason-free
    Forbidden,

    /// Not found (404) - absent, or filtered out by visibility
    NotFound(String),

    /// Conflict (409) - e.g. duplicate username
    Conflict(String),

    /// Unprocessable entity (422) - field validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "forbidden", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Forbidden".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but do not expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Converts validator failures into the structured field-error mapping
pub fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| ValidationErrorDetail {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field)),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                // A dangling reference in the payload, not a server fault.
                // Constraint names stay out of the response.
                ErrorKind::ForeignKeyViolation => {
                    ApiError::BadRequest("Referenced resource does not exist".to_string())
                }
                ErrorKind::UniqueViolation => {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("username") {
                        ApiError::Conflict("Username already taken".to_string())
                    } else if constraint.contains("email") {
                        ApiError::Conflict("Email already registered".to_string())
                    } else {
                        ApiError::Conflict("Resource already exists".to_string())
                    }
                }
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                    ApiError::BadRequest("Invalid data".to_string())
                }
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database unavailable".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert authorization denials to API errors
impl From<taskboard_shared::auth::authorization::AuthzError> for ApiError {
    fn from(err: taskboard_shared::auth::authorization::AuthzError) -> Self {
        use taskboard_shared::auth::authorization::AuthzError;
        match err {
            AuthzError::Forbidden => ApiError::Forbidden,
            AuthzError::DatabaseError(e) => e.into(),
        }
    }
}

/// Convert JWT errors to API errors
impl From<taskboard_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: taskboard_shared::auth::jwt::JwtError) -> Self {
        use taskboard_shared::auth::jwt::JwtError;
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<taskboard_shared::auth::password::PasswordError> for ApiError {
    fn from(err: taskboard_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::auth::authorization::AuthzError;

    #[derive(Debug)]
    enum StubKind {
        ForeignKey,
        Unique,
    }

    #[derive(Debug)]
    struct StubDbError {
        kind: StubKind,
        constraint: &'static str,
    }

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stub database error")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint).filter(|c| !c.is_empty())
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.kind {
                StubKind::ForeignKey => sqlx::error::ErrorKind::ForeignKeyViolation,
                StubKind::Unique => sqlx::error::ErrorKind::UniqueViolation,
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(kind: StubKind, constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError { kind, constraint }))
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Project not found".to_string());
        assert_eq!(err.to_string(), "Not found: Project not found");
    }

    #[test]
    fn test_forbidden_is_opaque() {
        // The 403 body must never explain the denial.
        assert_eq!(ApiError::Forbidden.to_string(), "Forbidden");
    }

    #[test]
    fn test_authz_denial_maps_to_forbidden() {
        let err: ApiError = AuthzError::Forbidden.into();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_foreign_key_violation_is_bad_request() {
        // Assigning a nonexistent user to a project is a client mistake,
        // not a conflict.
        let err: ApiError = db_error(StubKind::ForeignKey, "project_memberships_user_id_fkey").into();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(!err.to_string().contains("fkey"));
    }

    #[test]
    fn test_unique_violation_hides_constraint_name() {
        let err: ApiError = db_error(StubKind::Unique, "some_internal_constraint_key").into();
        match err {
            ApiError::Conflict(msg) => assert!(!msg.contains("constraint")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_username_unique_violation_is_conflict() {
        let err: ApiError = db_error(StubKind::Unique, "users_username_key").into();
        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "Username already taken"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_error_shape() {
        let errors = vec![
            ValidationErrorDetail {
                field: "username".to_string(),
                message: "Username must be at least 3 characters".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }
}
