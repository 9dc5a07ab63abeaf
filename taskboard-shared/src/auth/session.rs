/// Session credentials carried by requests
///
/// A session token travels either in `Authorization: Bearer <token>` or in
/// the `taskboard_session` cookie set at login. The header wins when both
/// are present.
///
/// After successful authentication the API layer adds an [`AuthContext`] to
/// the request extensions.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::session::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Signed in as {}", auth.username)
/// }
/// ```

use axum::http::{header, HeaderMap};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "taskboard_session";

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
}

/// Why a request carries no usable session
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid session: {0}")]
    InvalidToken(#[from] JwtError),
}

/// Finds the session token in the headers
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

/// Validates the request's session token
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers).ok_or(AuthError::MissingCredentials)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext {
        user_id: claims.sub,
        username: claims.username,
    })
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value opening a session
pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.num_seconds().max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value ending the session
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;

    const SECRET: &str = "session-test-secret-at-least-32-bytes";

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_extract_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; taskboard_session=tok123; other=1"),
        );
        assert_eq!(extract_token(&headers), Some("tok123"));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("taskboard_session=from-cookie"));
        assert_eq!(extract_token(&headers), Some("from-header"));
    }

    #[test]
    fn test_missing_or_malformed_credentials() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("taskboard_session="));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_authenticate() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "alice", Duration::hours(1)), SECRET).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
        );

        let auth = authenticate(&headers, SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.username, "alice");

        assert!(matches!(
            authenticate(&headers, "some-other-secret-at-least-32-bytes"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            authenticate(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", Duration::hours(24), false);
        assert_eq!(
            cookie,
            "taskboard_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );
        assert!(session_cookie("tok", Duration::hours(1), true).ends_with("; Secure"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
