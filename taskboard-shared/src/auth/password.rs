/// Password hashing and strength rules
///
/// Passwords are hashed with Argon2id and stored as PHC strings; plaintext
/// never reaches the database.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Correct-H0rse")?;
///
/// assert!(verify_password("Correct-H0rse", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Reason a password was rejected at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WeakPassword {
    #[error("Password must be at least 8 characters long")]
    TooShort,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password must contain at least one special character")]
    MissingSpecial,

    #[error("Password is too similar to the username")]
    SameAsUsername,
}

/// Hashes a password using Argon2id
///
/// Returns a PHC string:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// `Ok(false)` means the password is wrong; `Err` means the hash itself
/// could not be used.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the hash
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks a new password against the registration rules
///
/// - at least 8 characters
/// - an uppercase letter, a lowercase letter, a digit and a special
///   character
/// - not the username, ignoring case
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{validate_password_strength, WeakPassword};
///
/// assert!(validate_password_strength("MyP@ssw0rd!", "alice").is_ok());
/// assert_eq!(validate_password_strength("Sh0rt!", "alice"), Err(WeakPassword::TooShort));
/// assert_eq!(validate_password_strength("Password123", "alice"), Err(WeakPassword::MissingSpecial));
/// ```
pub fn validate_password_strength(password: &str, username: &str) -> Result<(), WeakPassword> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(WeakPassword::TooShort);
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(WeakPassword::MissingUppercase);
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(WeakPassword::MissingLowercase);
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err(WeakPassword::MissingDigit);
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(WeakPassword::MissingSpecial);
    }

    if !username.is_empty() && password.to_lowercase() == username.to_lowercase() {
        return Err(WeakPassword::SameAsUsername);
    }

    Ok(())
}
