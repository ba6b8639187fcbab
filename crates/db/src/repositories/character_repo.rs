//! Repository for the `characters` table.

use bestiary_core::types::{DbId, RowUuid};
use sqlx::PgPool;

use crate::models::character::{CharacterRecord, NewCharacterRecord};
use crate::repositories::RequestRepo;

/// Column list for `characters` queries.
const COLUMNS: &str = "\
    id, character_data, image_filename, image_fetch_url, user_id, public, created_at";

/// Provides insert and lookup operations for generated characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a generated character.
    pub async fn insert(
        pool: &PgPool,
        input: &NewCharacterRecord,
    ) -> Result<CharacterRecord, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let record = Self::insert_inner(&mut tx, input).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Insert a character and mark its request processed in one transaction.
    ///
    /// Returns `None` (and writes nothing) if the request was already
    /// processed by someone else.
    pub async fn insert_for_request(
        pool: &PgPool,
        request_uuid: RowUuid,
        input: &NewCharacterRecord,
    ) -> Result<Option<CharacterRecord>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let record = Self::insert_inner(&mut tx, input).await?;

        if !RequestRepo::mark_processed_inner(&mut tx, request_uuid).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(record))
    }

    /// Find a character by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CharacterRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        sqlx::query_as::<_, CharacterRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's characters, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: RowUuid,
    ) -> Result<Vec<CharacterRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CharacterRecord>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn insert_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewCharacterRecord,
    ) -> Result<CharacterRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO characters (character_data, image_filename, image_fetch_url, user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CharacterRecord>(&query)
            .bind(&input.character_data)
            .bind(&input.image_filename)
            .bind(&input.image_fetch_url)
            .bind(input.user_id)
            .fetch_one(&mut **tx)
            .await
    }
}
