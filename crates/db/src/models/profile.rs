//! User profile models (read-only).

use bestiary_core::types::{RowUuid, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: RowUuid,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub notification_external_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Where to send completion notifications for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub notification_external_id: Option<String>,
}

impl From<Profile> for ContactDetails {
    fn from(profile: Profile) -> Self {
        Self {
            display_name: profile.display_name,
            email: profile.email.filter(|e| !e.trim().is_empty()),
            notification_external_id: profile
                .notification_external_id
                .filter(|id| !id.trim().is_empty()),
        }
    }
}
