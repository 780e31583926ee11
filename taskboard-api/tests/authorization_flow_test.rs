/// Authorization flow tests against a live database
///
/// These verify the behavior that only PostgreSQL can answer: the membership
/// upsert, and the visibility and write checks that run as SQL. Tests skip
/// themselves when `DATABASE_URL` is not set so the rest of the suite stays
/// runnable without infrastructure.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
use taskboard_shared::models::membership::{AssignMembership, ProjectMembership, ProjectRole};
use taskboard_shared::models::project::{CreateProject, Project};
use taskboard_shared::models::task::{CreateTask, Task};
use taskboard_shared::models::user::{CreateUser, GlobalRole, User};
use tower::Service as _;
use uuid::Uuid;

/// Test context over a real database
struct DbContext {
    db: PgPool,
    app: axum::Router,
}

impl DbContext {
    /// Connects and migrates; `None` when `DATABASE_URL` is not set
    async fn try_new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let db = PgPool::connect(&url).await.expect("database connection");
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: common::TEST_SECRET.to_string(),
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(Self { db, app })
    }

    async fn create_user(&self, role: GlobalRole) -> User {
        User::create(
            &self.db,
            CreateUser {
                username: format!("user-{}", Uuid::new_v4()),
                email: None,
                password_hash: "unused-in-these-tests".to_string(),
                role,
            },
        )
        .await
        .expect("user")
    }

    async fn create_project(&self, creator: &User, name: &str) -> Project {
        Project::create(
            &self.db,
            creator.id,
            CreateProject {
                name: name.to_string(),
                description: String::new(),
                start_date: None,
                end_date: None,
            },
        )
        .await
        .expect("project")
    }

    fn auth_header(&self, user: &User) -> String {
        let claims = Claims::new(user.id, TokenType::Access);
        let token = create_token(&claims, common::TEST_SECRET).expect("token");
        format!("Bearer {}", token)
    }

    /// Deleting the users cascades to everything they created
    async fn cleanup(&self, users: &[&User]) {
        for user in users {
            User::delete(&self.db, user.id).await.expect("cleanup");
        }
    }
}

#[tokio::test]
async fn test_membership_assign_is_idempotent() {
    let Some(ctx) = DbContext::try_new().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let creator = ctx.create_user(GlobalRole::Collaborator).await;
    let member = ctx.create_user(GlobalRole::Collaborator).await;
    let project = ctx.create_project(&creator, "Atlas").await;

    ProjectMembership::assign(
        &ctx.db,
        project.id,
        AssignMembership {
            user_id: member.id,
            role: ProjectRole::Viewer,
        },
    )
    .await
    .unwrap();

    // Re-assigning must change the role in place, never add a second row
    let updated = ProjectMembership::assign(
        &ctx.db,
        project.id,
        AssignMembership {
            user_id: member.id,
            role: ProjectRole::Collaborator,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.role, ProjectRole::Collaborator);

    let memberships = ProjectMembership::list_for_project(&ctx.db, project.id)
        .await
        .unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].role, ProjectRole::Collaborator);

    ctx.cleanup(&[&creator, &member]).await;
}

#[tokio::test]
async fn test_viewer_membership_grants_read_but_not_write() {
    let Some(ctx) = DbContext::try_new().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let creator = ctx.create_user(GlobalRole::Collaborator).await;
    let member = ctx.create_user(GlobalRole::Collaborator).await;
    let project = ctx.create_project(&creator, "Borealis").await;

    ProjectMembership::assign(
        &ctx.db,
        project.id,
        AssignMembership {
            user_id: member.id,
            role: ProjectRole::Viewer,
        },
    )
    .await
    .unwrap();

    // The membership makes the project visible
    let request = Request::builder()
        .uri(format!("/v1/projects/{}", project.id))
        .header("authorization", ctx.auth_header(&member))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // But a viewer membership does not let a global collaborator write
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/projects/{}", project.id))
        .header("authorization", ctx.auth_header(&member))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "name": "Renamed" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = common::body_json(response).await;
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "Forbidden");

    ctx.cleanup(&[&creator, &member]).await;
}

#[tokio::test]
async fn test_foreign_task_resolves_as_absent() {
    let Some(ctx) = DbContext::try_new().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let creator = ctx.create_user(GlobalRole::Collaborator).await;
    let outsider = ctx.create_user(GlobalRole::Collaborator).await;
    let project = ctx.create_project(&creator, "Cascade").await;

    let task = Task::create(
        &ctx.db,
        creator.id,
        CreateTask {
            project_id: project.id,
            name: "Private work".to_string(),
            description: String::new(),
            assignee: None,
            due_date: None,
        },
    )
    .await
    .unwrap();

    // No membership, no creatorship: the task must look nonexistent
    let request = Request::builder()
        .uri(format!("/v1/tasks/{}", task.id))
        .header("authorization", ctx.auth_header(&outsider))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The creator keeps seeing it
    let request = Request::builder()
        .uri(format!("/v1/tasks/{}", task.id))
        .header("authorization", ctx.auth_header(&creator))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup(&[&creator, &outsider]).await;
}
