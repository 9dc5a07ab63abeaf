/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and registration strength rules
/// - [`jwt`]: session token generation and validation
/// - [`session`]: reading the session from request headers, session cookies
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Us3r-password")?;
/// assert!(verify_password("Us3r-password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "alice", Duration::hours(24));
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod session;
