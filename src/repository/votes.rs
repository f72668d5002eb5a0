use crate::domain::models::{TargetKind, VoteDirection, VoteRecord};
use crate::error::{VoteError, VoteResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Durable mapping from (voter, target) to the current vote direction.
///
/// Implementations must enforce at-most-one record per
/// (voter_id, target_id, target_kind) at the storage layer, not just in
/// application logic.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Current vote record for a (voter, target) pair, if any.
    async fn get(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> VoteResult<Option<VoteRecord>>;

    /// Upsert a record: insert it, or overwrite the direction of the
    /// existing record for the same (voter, target) key.
    async fn put(&self, record: &VoteRecord) -> VoteResult<()>;

    /// Insert a record only if the (voter, target) key is free.
    /// Returns true if a row was inserted.
    async fn insert_new(&self, record: &VoteRecord) -> VoteResult<bool>;

    /// Delete the record for a (voter, target) pair.
    /// Returns true if a row was removed.
    async fn delete(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> VoteResult<bool>;

    /// All of a voter's records among the given targets, in one query.
    /// Targets the voter has not voted on simply have no entry.
    async fn list_for_voter(
        &self,
        voter_id: Uuid,
        target_ids: &[Uuid],
    ) -> VoteResult<Vec<VoteRecord>>;
}

/// Raw votes row; narrowed to the domain type after fetching.
#[derive(sqlx::FromRow)]
struct VoteRow {
    id: Uuid,
    voter_id: Uuid,
    target_id: Uuid,
    target_kind: String,
    direction: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<VoteRow> for VoteRecord {
    type Error = VoteError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let target_kind = row
            .target_kind
            .parse::<TargetKind>()
            .map_err(anyhow::Error::msg)?;
        let direction = VoteDirection::try_from(row.direction)
            .map_err(|raw| anyhow::anyhow!("invalid vote direction in store: {}", raw))?;
        Ok(VoteRecord {
            id: row.id,
            voter_id: row.voter_id,
            target_id: row.target_id,
            target_kind,
            direction,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed vote store.
#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn get(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> VoteResult<Option<VoteRecord>> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_id, target_id, target_kind, direction, created_at
            FROM votes
            WHERE voter_id = $1 AND target_id = $2 AND target_kind = $3
            "#,
        )
        .bind(voter_id)
        .bind(target_id)
        .bind(target_kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VoteRecord::try_from).transpose()
    }

    async fn put(&self, record: &VoteRecord) -> VoteResult<()> {
        sqlx::query(
            r#"
            INSERT INTO votes (id, voter_id, target_id, target_kind, direction, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (voter_id, target_id, target_kind)
            DO UPDATE SET direction = EXCLUDED.direction
            "#,
        )
        .bind(record.id)
        .bind(record.voter_id)
        .bind(record.target_id)
        .bind(record.target_kind.as_str())
        .bind(record.direction.value() as i16)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_new(&self, record: &VoteRecord) -> VoteResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO votes (id, voter_id, target_id, target_kind, direction, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (voter_id, target_id, target_kind) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.voter_id)
        .bind(record.target_id)
        .bind(record.target_kind.as_str())
        .bind(record.direction.value() as i16)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> VoteResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM votes
            WHERE voter_id = $1 AND target_id = $2 AND target_kind = $3
            "#,
        )
        .bind(voter_id)
        .bind(target_id)
        .bind(target_kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_voter(
        &self,
        voter_id: Uuid,
        target_ids: &[Uuid],
    ) -> VoteResult<Vec<VoteRecord>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_id, target_id, target_kind, direction, created_at
            FROM votes
            WHERE voter_id = $1 AND target_id = ANY($2)
            "#,
        )
        .bind(voter_id)
        .bind(target_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VoteRecord::try_from).collect()
    }
}
