use crate::domain::models::{TargetKind, TargetSummary};
use crate::error::{VoteError, VoteResult};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Read and score-mutation access to vote targets (posts, comments).
///
/// The content service owns the rows; this store touches only the
/// denormalized `vote_count` column, and only through atomic deltas.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Look up a target's author and current score.
    async fn find(&self, target_id: Uuid, kind: TargetKind) -> VoteResult<Option<TargetSummary>>;

    /// Apply a signed delta to the target's score in a single atomic
    /// store operation and return the post-increment score. Never
    /// read-modify-write: concurrent voters must not lose updates.
    async fn apply_delta(&self, target_id: Uuid, kind: TargetKind, delta: i64) -> VoteResult<i64>;
}

/// PostgreSQL-backed target store over the posts/comments tables.
#[derive(Clone)]
pub struct PgTargetStore {
    pool: PgPool,
}

impl PgTargetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn table(kind: TargetKind) -> &'static str {
        match kind {
            TargetKind::Post => "posts",
            TargetKind::Comment => "comments",
        }
    }
}

#[async_trait]
impl TargetStore for PgTargetStore {
    async fn find(&self, target_id: Uuid, kind: TargetKind) -> VoteResult<Option<TargetSummary>> {
        let row: Option<(Uuid, i64)> = sqlx::query_as(&format!(
            "SELECT author_id, vote_count FROM {} WHERE id = $1",
            Self::table(kind),
        ))
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(author_id, score)| TargetSummary { author_id, score }))
    }

    async fn apply_delta(&self, target_id: Uuid, kind: TargetKind, delta: i64) -> VoteResult<i64> {
        // The increment happens inside the store; RETURNING hands back
        // the post-increment value without a second read.
        let new_score: Option<i64> = sqlx::query_scalar(&format!(
            "UPDATE {} SET vote_count = vote_count + $1 WHERE id = $2 RETURNING vote_count",
            Self::table(kind),
        ))
        .bind(delta)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        new_score.ok_or_else(|| VoteError::NotFound(format!("{} {}", kind, target_id)))
    }
}
