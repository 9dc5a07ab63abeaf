/// Profile endpoints
///
/// - `GET  /profile/:username/` - bio, completion metrics and recent tasks
/// - `GET|POST /profile/edit/` - the signed-in user's bio
///
/// A user without a profile row (an account created outside registration)
/// gets an empty one on first visit.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    forms::{AppJson, AppPath, FormDescriptor, ProfileForm},
};
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use taskboard_shared::{
    auth::session::AuthContext,
    metrics::ProfileMetrics,
    models::{profile::Profile, task::Task, task::TaskWithRelations, user::User},
};
use validator::Validate;

/// Tasks listed under "recent" on a profile
const RECENT_TASKS: i64 = 5;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub profile: Profile,
    pub metrics: ProfileMetrics,

    /// Newest tasks assigned to the user
    pub recent_tasks: Vec<TaskWithRelations>,

    /// Whether the viewer is looking at their own profile
    pub is_own_profile: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileEditResponse {
    pub profile: Profile,
    pub form: FormDescriptor,
}

/// # Errors
///
/// - `404`: no user with that username
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(username): AppPath<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let profile = Profile::get_or_create(&state.db, user.id).await?;
    let metrics = ProfileMetrics::load(&state.db, user.id, state.clock, state.now()).await?;
    let recent_tasks = Task::recent_assigned_to(&state.db, user.id, RECENT_TASKS).await?;

    Ok(Json(ProfileResponse {
        is_own_profile: user.id == auth.user_id,
        user,
        profile,
        metrics,
        recent_tasks,
    }))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileEditResponse>> {
    let profile = Profile::get_or_create(&state.db, auth.user_id).await?;

    Ok(Json(ProfileEditResponse {
        form: FormDescriptor::profile(&profile.bio),
        profile,
    }))
}

/// # Errors
///
/// - `422`: bio longer than 5000 characters
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(form): AppJson<ProfileForm>,
) -> ApiResult<Json<Profile>> {
    form.validate()?;

    Profile::get_or_create(&state.db, auth.user_id).await?;
    let profile = Profile::update_bio(&state.db, auth.user_id, &form.bio)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, "Profile updated");
    Ok(Json(profile))
}
