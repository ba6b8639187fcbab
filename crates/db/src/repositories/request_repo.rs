//! Repository for the `requests` queue table.
//!
//! A row is unprocessed until a worker persists its character. Workers take
//! a time-limited lease (`claimed_at`) while generating; an expired lease
//! makes the row claimable again.

use bestiary_core::types::RowUuid;
use sqlx::PgPool;

use crate::models::request::{NewRequest, QueuedRequest};

/// Column list for `requests` queries.
const COLUMNS: &str = "\
    uuid, size, species, \"challengeRating\", \"isLegendary\", \"user\", \
    \"isProcessed\", claimed_at, created_at";

/// Provides queue operations for generation requests.
pub struct RequestRepo;

impl RequestRepo {
    /// Enqueue a new unprocessed request.
    pub async fn submit(pool: &PgPool, input: &NewRequest) -> Result<QueuedRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO requests (size, species, \"challengeRating\", \"isLegendary\", \"user\") \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedRequest>(&query)
            .bind(&input.params.size)
            .bind(&input.params.species)
            .bind(&input.params.challenge_rating)
            .bind(input.params.is_legendary)
            .bind(input.user)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest unprocessed request.
    ///
    /// A row is claimable when it has no lease or its lease is older than
    /// `lease_secs`. Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent
    /// workers never claim the same row.
    pub async fn claim_next(
        pool: &PgPool,
        lease_secs: u64,
    ) -> Result<Option<QueuedRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE requests \
             SET claimed_at = NOW() \
             WHERE uuid = ( \
                 SELECT uuid FROM requests \
                 WHERE \"isProcessed\" = false \
                   AND (claimed_at IS NULL OR claimed_at < NOW() - make_interval(secs => $1)) \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedRequest>(&query)
            .bind(lease_secs as f64)
            .fetch_optional(pool)
            .await
    }

    /// Drop the lease on a request so the next poll can pick it up.
    pub async fn release_claim(pool: &PgPool, uuid: RowUuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE requests SET claimed_at = NULL WHERE uuid = $1 AND \"isProcessed\" = false",
        )
        .bind(uuid)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Flip `isProcessed` from false to true.
    ///
    /// Returns `false` if the row was already processed (or does not exist).
    pub async fn mark_processed(pool: &PgPool, uuid: RowUuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let updated = Self::mark_processed_inner(&mut tx, uuid).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Find a request by its UUID.
    pub async fn find_by_uuid(
        pool: &PgPool,
        uuid: RowUuid,
    ) -> Result<Option<QueuedRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requests WHERE uuid = $1");
        sqlx::query_as::<_, QueuedRequest>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Count requests still waiting for a character.
    pub async fn count_unprocessed(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE \"isProcessed\" = false")
            .fetch_one(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Compare-and-set `isProcessed` within an existing transaction.
    pub(crate) async fn mark_processed_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        uuid: RowUuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE requests SET \"isProcessed\" = true, claimed_at = NULL \
             WHERE uuid = $1 AND \"isProcessed\" = false",
        )
        .bind(uuid)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
