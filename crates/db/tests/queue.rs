//! Integration tests for the request queue, character persistence and
//! profile lookup against a real database.

use bestiary_core::request::GenerationParams;
use bestiary_db::models::character::NewCharacterRecord;
use bestiary_db::models::profile::ContactDetails;
use bestiary_db::models::request::NewRequest;
use bestiary_db::repositories::{CharacterRepo, ProfileRepo, RequestRepo};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LEASE_SECS: u64 = 300;

fn new_request(species: &str, user: Uuid) -> NewRequest {
    NewRequest {
        params: GenerationParams::new("Medium", species, "2", false),
        user,
    }
}

fn new_character(user_id: Uuid) -> NewCharacterRecord {
    NewCharacterRecord {
        character_data: json!({"name": "Snik", "attributes": {"STR": 8}}),
        image_filename: "https://cdn.example/snik.png".to_string(),
        image_fetch_url: None,
        user_id,
    }
}

/// Force an older `created_at` so ordering does not depend on insert timing.
async fn backdate(pool: &PgPool, uuid: Uuid, minutes: i32) {
    sqlx::query("UPDATE requests SET created_at = NOW() - make_interval(mins => $2) WHERE uuid = $1")
        .bind(uuid)
        .bind(minutes)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Submit / claim
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn submit_creates_unprocessed_row(pool: PgPool) {
    let user = Uuid::new_v4();
    let row = RequestRepo::submit(&pool, &new_request("goblin", user)).await.unwrap();

    assert_eq!(row.species, "goblin");
    assert_eq!(row.challenge_rating, "2");
    assert_eq!(row.user, user);
    assert!(!row.is_processed);
    assert!(!row.is_legendary);
    assert!(row.claimed_at.is_none());
    assert_eq!(RequestRepo::count_unprocessed(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn claim_on_empty_queue_returns_none(pool: PgPool) {
    assert!(RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn claim_takes_oldest_first(pool: PgPool) {
    let user = Uuid::new_v4();
    let newer = RequestRepo::submit(&pool, &new_request("kobold", user)).await.unwrap();
    let older = RequestRepo::submit(&pool, &new_request("goblin", user)).await.unwrap();
    backdate(&pool, older.uuid, 10).await;
    backdate(&pool, newer.uuid, 5).await;

    let first = RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().unwrap();
    assert_eq!(first.uuid, older.uuid);
    assert!(first.claimed_at.is_some());

    let second = RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().unwrap();
    assert_eq!(second.uuid, newer.uuid);

    // Both leases are live.
    assert!(RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn expired_lease_is_claimable_again(pool: PgPool) {
    let row = RequestRepo::submit(&pool, &new_request("goblin", Uuid::new_v4()))
        .await
        .unwrap();
    RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().unwrap();

    sqlx::query("UPDATE requests SET claimed_at = NOW() - INTERVAL '1 hour' WHERE uuid = $1")
        .bind(row.uuid)
        .execute(&pool)
        .await
        .unwrap();

    let reclaimed = RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().unwrap();
    assert_eq!(reclaimed.uuid, row.uuid);
}

#[sqlx::test(migrations = "./migrations")]
async fn released_claim_is_claimable_again(pool: PgPool) {
    let row = RequestRepo::submit(&pool, &new_request("goblin", Uuid::new_v4()))
        .await
        .unwrap();
    RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().unwrap();
    RequestRepo::release_claim(&pool, row.uuid).await.unwrap();

    let reclaimed = RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().unwrap();
    assert_eq!(reclaimed.uuid, row.uuid);
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn mark_processed_is_compare_and_set(pool: PgPool) {
    let row = RequestRepo::submit(&pool, &new_request("goblin", Uuid::new_v4()))
        .await
        .unwrap();

    assert!(RequestRepo::mark_processed(&pool, row.uuid).await.unwrap());
    assert!(!RequestRepo::mark_processed(&pool, row.uuid).await.unwrap());

    let stored = RequestRepo::find_by_uuid(&pool, row.uuid).await.unwrap().unwrap();
    assert!(stored.is_processed);
    assert!(RequestRepo::claim_next(&pool, LEASE_SECS).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn insert_for_request_writes_character_and_marks_processed(pool: PgPool) {
    let user = Uuid::new_v4();
    let row = RequestRepo::submit(&pool, &new_request("goblin", user)).await.unwrap();

    let record = CharacterRepo::insert_for_request(&pool, row.uuid, &new_character(user))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.user_id, user);
    assert_eq!(record.character_data["name"], "Snik");
    assert!(!record.public);
    assert!(RequestRepo::find_by_uuid(&pool, row.uuid).await.unwrap().unwrap().is_processed);
    assert_eq!(CharacterRepo::list_by_user(&pool, user).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn insert_for_processed_request_rolls_back(pool: PgPool) {
    let user = Uuid::new_v4();
    let row = RequestRepo::submit(&pool, &new_request("goblin", user)).await.unwrap();
    RequestRepo::mark_processed(&pool, row.uuid).await.unwrap();

    let result = CharacterRepo::insert_for_request(&pool, row.uuid, &new_character(user))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(CharacterRepo::list_by_user(&pool, user).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn insert_keeps_fetch_url(pool: PgPool) {
    let user = Uuid::new_v4();
    let mut input = new_character(user);
    input.image_fetch_url = Some("https://api.example/fetch/9".to_string());

    let record = CharacterRepo::insert(&pool, &input).await.unwrap();
    let found = CharacterRepo::find_by_id(&pool, record.id).await.unwrap().unwrap();
    assert_eq!(found.image_fetch_url.as_deref(), Some("https://api.example/fetch/9"));
    assert_eq!(found.image_filename, "https://cdn.example/snik.png");
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn find_contact_reads_profile(pool: PgPool) {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO profiles (id, display_name, email, notification_external_id) \
         VALUES ($1, 'Ada', 'ada@example.com', '')",
    )
    .bind(id)
    .execute(&pool)
    .await
    .unwrap();

    let contact = ProfileRepo::find_contact(&pool, id).await.unwrap().unwrap();
    assert_eq!(
        contact,
        ContactDetails {
            display_name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            // Blank ids are treated as absent.
            notification_external_id: None,
        }
    );

    assert!(ProfileRepo::find_contact(&pool, Uuid::new_v4()).await.unwrap().is_none());
}
