/// Route handlers, grouped by resource
///
/// - `health`: liveness and database status
/// - `auth`: register, login, logout
/// - `tasks`: list, detail, create, edit, delete, status updates
/// - `kanban`: board grouped by status
/// - `categories`: list, search, create, delete
/// - `profiles`: public profile with metrics, bio editing

pub mod auth;
pub mod categories;
pub mod health;
pub mod kanban;
pub mod profiles;
pub mod tasks;
