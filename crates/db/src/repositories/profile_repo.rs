//! Read-only access to the `profiles` table.

use bestiary_core::types::RowUuid;
use sqlx::PgPool;

use crate::models::profile::{ContactDetails, Profile};

/// Column list for `profiles` queries.
const COLUMNS: &str = "\
    id, display_name, avatar_url, email, notification_external_id, created_at, updated_at";

pub struct ProfileRepo;

impl ProfileRepo {
    /// Find a profile by user ID.
    pub async fn find_by_id(pool: &PgPool, id: RowUuid) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Notification contact details for a user, if they have a profile.
    pub async fn find_contact(
        pool: &PgPool,
        id: RowUuid,
    ) -> Result<Option<ContactDetails>, sqlx::Error> {
        Ok(Self::find_by_id(pool, id).await?.map(ContactDetails::from))
    }
}
