/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::require_session},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::calendar::LocalClock;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through the `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    /// Local calendar used for date filters and metrics windows
    pub clock: LocalClock,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let clock = LocalClock::from_offset_minutes(config.display.utc_offset_minutes)
            .unwrap_or_else(|| {
                tracing::warn!(
                    offset = config.display.utc_offset_minutes,
                    "UTC offset out of range, using UTC"
                );
                LocalClock::utc()
            });

        Self {
            db,
            config: Arc::new(config),
            clock,
        }
    }

    /// Secret used to sign and verify session tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds the complete router
///
/// ```text
/// /health                         public
/// /login/  /logout/  /register/   public
/// /                               task list (filters + pagination)
/// /kanban/
/// /task/create/
/// /task/:id/                      detail
/// /task/:id/edit/
/// /task/:id/delete/
/// /task/:id/update-status/        urlencoded POST, JSON reply
/// /categories/
/// /categories/:id/delete/
/// /profile/edit/
/// /profile/:username/
/// ```
///
/// Everything except the public routes sits behind [`require_session`].
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/login/",
            get(routes::auth::login_form).post(routes::auth::login),
        )
        .route(
            "/logout/",
            get(routes::auth::logout).post(routes::auth::logout),
        )
        .route(
            "/register/",
            get(routes::auth::register_form).post(routes::auth::register),
        );

    let protected_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/kanban/", get(routes::kanban::kanban_board))
        .route(
            "/task/create/",
            get(routes::tasks::create_form).post(routes::tasks::create_task),
        )
        .route("/task/:id/", get(routes::tasks::task_detail))
        .route(
            "/task/:id/edit/",
            get(routes::tasks::edit_form).post(routes::tasks::update_task),
        )
        .route(
            "/task/:id/delete/",
            get(routes::tasks::delete_confirm).post(routes::tasks::delete_task),
        )
        .route(
            "/task/:id/update-status/",
            post(routes::tasks::update_status),
        )
        .route(
            "/categories/",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/categories/:id/delete/",
            post(routes::categories::delete_category),
        )
        .route(
            "/profile/edit/",
            get(routes::profiles::edit_form).post(routes::profiles::update_profile),
        )
        .route("/profile/:username/", get(routes::profiles::profile))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
