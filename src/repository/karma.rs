use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Reputation counter on content authors.
///
/// Written only from karma workers, off the vote path; errors here are
/// the caller's to log and drop.
#[async_trait]
pub trait KarmaStore: Send + Sync {
    /// Atomically adjust an author's karma by a signed delta.
    async fn adjust(&self, author_id: Uuid, delta: i64) -> Result<()>;
}

/// PostgreSQL-backed karma store over the users table.
#[derive(Clone)]
pub struct PgKarmaStore {
    pool: PgPool,
}

impl PgKarmaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KarmaStore for PgKarmaStore {
    async fn adjust(&self, author_id: Uuid, delta: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET karma = karma + $1
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .context("Failed to adjust author karma")?;

        if result.rows_affected() == 0 {
            // Author deleted since the vote landed; nothing to credit.
            debug!(author_id = %author_id, "Karma adjustment target missing");
        }

        Ok(())
    }
}
