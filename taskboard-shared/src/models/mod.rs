/// Database models for Taskboard
///
/// Each model owns its CRUD queries.
///
/// - `user`: accounts and login names
/// - `profile`: one-per-user profile with a bio
/// - `category`: shared task labels
/// - `task`: tasks, their statuses and blocker edges
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::category::Category;
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let category = Category::create(&pool, "Infrastructure").await?;
/// let all = Category::list(&pool, Some("infra")).await?;
/// assert!(all.iter().any(|c| c.id == category.id));
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod profile;
pub mod task;
pub mod user;
