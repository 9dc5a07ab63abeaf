/// Login gate for protected routes
///
/// Requests without a valid session are redirected to the login page with
/// the original path in `next`. A token whose user has since been deleted
/// counts as no session.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskboard_shared::{auth::session, models::user::User};

use crate::{app::AppState, error::ApiError};

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let next_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let auth = match session::authenticate(req.headers(), state.jwt_secret()) {
        Ok(auth) => auth,
        Err(err) => {
            tracing::debug!(error = %err, path = %next_path, "Session rejected");
            return Err(ApiError::LoginRequired { next: next_path });
        }
    };

    if User::find_by_id(&state.db, auth.user_id).await?.is_none() {
        tracing::debug!(user_id = %auth.user_id, "Session refers to a deleted user");
        return Err(ApiError::LoginRequired { next: next_path });
    }

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
