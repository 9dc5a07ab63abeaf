/// Profile model and database operations
///
/// One profile per user, keyed by `user_id`. Registration creates it in the
/// same transaction as the user; [`Profile::get_or_create`] covers accounts
/// that predate that.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     bio TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Maximum bio length, in characters
pub const MAX_BIO_LENGTH: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Free text, empty by default
    pub bio: String,

    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Creates the profile of a freshly registered user
    pub async fn create<'e, E>(executor: E, user_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            RETURNING id, user_id, bio, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(profile)
    }

    /// Returns the user's profile, creating an empty one if missing
    ///
    /// Safe under concurrent calls: the unique `user_id` makes the losing
    /// insert a no-op.
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(pool)
            .await?;

        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, bio, created_at FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// Replaces the bio of the user's profile
    pub async fn update_bio(
        pool: &PgPool,
        user_id: Uuid,
        bio: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET bio = $2
            WHERE user_id = $1
            RETURNING id, user_id, bio, created_at
            "#,
        )
        .bind(user_id)
        .bind(bio)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}
