/// Application state and router builder
///
/// Defines the shared application state and builds the axum router with all
/// routes and middleware. The authenticated router group runs every request
/// through `actor_auth_layer`, which resolves the acting user exactly once:
/// token validation, a single user-row load for the current role snapshot,
/// and an `is_active` check. Handlers then receive an immutable
/// [`Actor`](taskboard_shared::auth::authorization::Actor) and never look up
/// the role again within the request.

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::{authorization::Actor, jwt};
use taskboard_shared::models::user::User;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via axum's `State` extractor; Arc keeps it cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete axum router
///
/// ```text
/// /
/// ├── /health                                # public
/// └── /v1/
///     ├── /auth/  register | login | refresh # public
///     │          me                          # authenticated
///     ├── /users/:id/role                    # authenticated (admin gate in handler)
///     ├── /projects[/...]                    # authenticated
///     ├── /tasks[/...]                       # authenticated
///     ├── /comments/:id                      # authenticated
///     └── /notifications[/...]               # authenticated
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Everything below requires a resolved actor
    let auth_private = Router::new().route("/me", get(routes::auth::me));

    let user_routes = Router::new().route("/:id/role", put(routes::users::set_role));

    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects))
        .route("/", post(routes::projects::create_project))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", put(routes::projects::update_project))
        .route("/:id", delete(routes::projects::delete_project))
        .route("/:id/memberships", get(routes::projects::list_memberships))
        .route("/:id/memberships", put(routes::projects::set_membership))
        .route(
            "/:id/memberships/:user_id",
            delete(routes::projects::remove_membership),
        );

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/comments", get(routes::tasks::list_comments))
        .route("/:id/comments", post(routes::tasks::add_comment));

    let comment_routes = Router::new()
        .route("/:id", put(routes::comments::update_comment))
        .route("/:id", delete(routes::comments::delete_comment));

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/", post(routes::notifications::create_notification))
        .route("/:id", get(routes::notifications::get_notification))
        .route("/:id", delete(routes::notifications::delete_notification))
        .route("/:id/read", post(routes::notifications::mark_read))
        .route("/:id/unread", post(routes::notifications::mark_unread));

    let authenticated = Router::new()
        .nest("/auth", auth_private)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes)
        .nest("/notifications", notification_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            actor_auth_layer,
        ));

    let v1_routes = Router::new().merge(authenticated).nest("/auth", auth_public);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(false))
        .with_state(state)
}

/// Actor-resolving authentication layer
///
/// Validates the bearer token, then loads the user row once to snapshot the
/// current global role. The snapshot rides on the request as an `Actor`
/// extension; nothing downstream re-reads the role.
async fn actor_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    use crate::error::ApiError;

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    // One role snapshot per request; also rejects deactivated accounts even
    // if their token is still within its lifetime.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is inactive".to_string()));
    }

    let actor = Actor {
        user_id: user.id,
        role: user.role,
    };
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
