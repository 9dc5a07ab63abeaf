/// Middleware for the API server
///
/// - `security`: response security headers
/// - `session`: login gate for protected routes

pub mod security;
pub mod session;
