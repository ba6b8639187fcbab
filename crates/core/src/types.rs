/// Primary key of the `characters` table (PostgreSQL BIGSERIAL).
pub type DbId = i64;

/// Queue rows and users are keyed by UUID.
pub type RowUuid = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
