/// Authentication endpoints
///
/// - `GET  /register/` - registration form
/// - `POST /register/` - create an account and sign in
/// - `GET  /login/`    - login form, or a redirect home when already signed in
/// - `POST /login/`    - sign in
/// - `GET|POST /logout/` - end the session
///
/// A successful register or login sets the `taskboard_session` cookie and
/// also returns the token in the body for clients that prefer
/// `Authorization: Bearer`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    forms::{AppJson, FormDescriptor, LoginForm, RegisterForm},
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password, session},
    models::{
        profile::Profile,
        user::{CreateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// `?next=` on the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub form: FormDescriptor,

    /// Where a successful login will go
    pub next: String,
}

/// Body returned when a session opens
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,

    pub username: String,

    pub token: String,

    pub expires_at: DateTime<Utc>,

    /// Page to continue to
    pub redirect_to: String,
}

/// Local redirect target, or `/` for anything that could leave the site
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn open_session(
    state: &AppState,
    user: &User,
    redirect_to: String,
) -> ApiResult<(String, SessionResponse)> {
    let ttl = Duration::hours(state.config.jwt.ttl_hours);
    let claims = jwt::Claims::new(user.id, user.username.clone(), ttl);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let cookie = session::session_cookie(&token, ttl, state.config.api.production);
    let expires_at =
        DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(|| Utc::now() + ttl);

    Ok((
        cookie,
        SessionResponse {
            user_id: user.id,
            username: user.username.clone(),
            token,
            expires_at,
            redirect_to,
        },
    ))
}

pub async fn register_form() -> Json<FormDescriptor> {
    Json(FormDescriptor::register())
}

/// Creates the user and their empty profile in one transaction
///
/// # Errors
///
/// - `422`: blank or malformed fields, mismatched or weak passwords
/// - `409`: username taken
pub async fn register(
    State(state): State<AppState>,
    AppJson(form): AppJson<RegisterForm>,
) -> ApiResult<Response> {
    form.validate()?;
    form.check_passwords_match()?;
    password::validate_password_strength(&form.password1, &form.username)?;

    if User::find_by_username(&state.db, &form.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A user with that username already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&form.password1)?;

    let mut tx = state.db.begin().await?;
    let user = User::create(
        &mut *tx,
        &CreateUser {
            username: form.username.clone(),
            password_hash,
        },
    )
    .await?;
    Profile::create(&mut *tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let (cookie, body) = open_session(&state, &user, "/".to_string())?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(body),
    )
        .into_response())
}

/// Login form; a visitor who is already signed in goes straight home
pub async fn login_form(
    State(state): State<AppState>,
    Query(params): Query<NextParam>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    if let Ok(auth) = session::authenticate(&headers, state.jwt_secret()) {
        if User::find_by_id(&state.db, auth.user_id).await?.is_some() {
            return Ok(Redirect::to("/").into_response());
        }
    }

    Ok(Json(LoginPage {
        form: FormDescriptor::login(),
        next: safe_next(params.next.as_deref()),
    })
    .into_response())
}

/// Verifies the credentials and opens a session
///
/// Unknown usernames and wrong passwords get the same `401`.
pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<NextParam>,
    AppJson(form): AppJson<LoginForm>,
) -> ApiResult<Response> {
    form.validate()?;

    let user = User::find_by_username(&state.db, &form.username)
        .await?
        .ok_or_else(|| {
            tracing::debug!(username = %form.username, "Login for unknown user");
            ApiError::Unauthorized(INVALID_LOGIN.to_string())
        })?;

    if !password::verify_password(&form.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_LOGIN.to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    let (cookie, body) = open_session(&state, &user, safe_next(params.next.as_deref()))?;

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Clears the session cookie; bearer tokens simply expire
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session::clear_session_cookie())],
        Json(LogoutResponse { logged_out: true }),
    )
}
