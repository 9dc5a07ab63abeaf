/// Shared setup for the API integration tests
///
/// Tests need a PostgreSQL database in `DATABASE_URL`; without one,
/// [`TestContext::new`] returns `None` and the test returns early.
/// Every test creates its own users and categories, so tests can share
/// one database and run in parallel.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use sqlx::PgPool;
use taskboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, DisplayConfig, JwtConfig},
};
use taskboard_shared::{
    auth::jwt::{create_token, Claims},
    models::{
        category::Category,
        profile::Profile,
        user::{CreateUser, User},
    },
};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub user: User,
    pub token: String,
}

/// Status, headers and JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        };

        let db = PgPool::connect(&url).await.expect("connect to test database");
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
                ttl_hours: 24,
            },
            display: DisplayConfig {
                utc_offset_minutes: 0,
            },
        };

        let app = build_router(AppState::new(db.clone(), config));
        let (user, token) = create_user(&db, "tester", true).await;

        Some(Self {
            db,
            app,
            user,
            token,
        })
    }

    pub async fn create_user(&self, prefix: &str) -> (User, String) {
        create_user(&self.db, prefix, true).await
    }

    /// A user with no profile row, like an account created from the shell
    pub async fn create_user_without_profile(&self, prefix: &str) -> (User, String) {
        create_user(&self.db, prefix, false).await
    }

    pub async fn create_category(&self) -> Category {
        Category::create(&self.db, &unique_name("category"))
            .await
            .expect("create category")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.expect("send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// GET as the default test user
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_as(uri, Some(&self.token)).await
    }

    pub async fn get_as(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// JSON POST as the default test user
    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.post_json_as(uri, body, Some(&self.token)).await
    }

    pub async fn post_json_as(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Urlencoded POST as the default test user
    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

async fn create_user(db: &PgPool, prefix: &str, with_profile: bool) -> (User, String) {
    let user = User::create(
        db,
        &CreateUser {
            username: unique_name(prefix),
            password_hash: "not-used-in-tests".to_string(),
        },
    )
    .await
    .expect("create user");
    if with_profile {
        Profile::create(db, user.id).await.expect("create profile");
    }

    let claims = Claims::new(user.id, user.username.clone(), Duration::hours(1));
    let token = create_token(&claims, JWT_SECRET).expect("create token");

    (user, token)
}
