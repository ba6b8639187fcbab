//! Generation queue worker.
//!
//! [`QueueWorker::poll_and_process_one`] claims the oldest unprocessed
//! request, runs the generation pipeline, persists the character and marks
//! the request processed in one transaction, then sends best-effort
//! notifications. Failures never escape: they are logged, the claim is
//! released, and the row is retried on a later poll.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use bestiary_core::types::{DbId, RowUuid};
use bestiary_db::models::character::NewCharacterRecord;
use bestiary_db::models::request::QueuedRequest;
use bestiary_db::repositories::{CharacterRepo, ProfileRepo, RequestRepo};
use bestiary_events::{CharacterNotice, Notifier};
use bestiary_pipeline::{CharacterOrchestrator, PipelineError};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Errors inside a single processing run. Never returned to callers of
/// [`QueueWorker::poll_and_process_one`].
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Could not serialize character: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No claimable request.
    Idle,
    /// A character was persisted and the request marked processed.
    Processed {
        request_uuid: RowUuid,
        character_id: DbId,
    },
    /// Another worker finished the request first; nothing was written.
    AlreadyProcessed { request_uuid: RowUuid },
    /// The run failed; the request stays unprocessed.
    Failed {
        request_uuid: Option<RowUuid>,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

pub struct QueueWorker {
    pool: PgPool,
    orchestrator: CharacterOrchestrator,
    notifier: Option<Arc<dyn Notifier>>,
    lease_secs: u64,
}

impl QueueWorker {
    pub fn new(pool: PgPool, orchestrator: CharacterOrchestrator, lease_secs: u64) -> Self {
        Self {
            pool,
            orchestrator,
            notifier: None,
            lease_secs,
        }
    }

    /// Send completion notifications through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Claim and process at most one request.
    pub async fn poll_and_process_one(&self) -> PollOutcome {
        let request = match RequestRepo::claim_next(&self.pool, self.lease_secs).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("No unprocessed requests");
                return PollOutcome::Idle;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim request");
                return PollOutcome::Failed {
                    request_uuid: None,
                    reason: e.to_string(),
                };
            }
        };

        let request_uuid = request.uuid;
        tracing::info!(%request_uuid, species = %request.species, "Claimed request");

        match self.process(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(%request_uuid, error = %e, "Request processing failed");
                if let Err(release_err) = RequestRepo::release_claim(&self.pool, request_uuid).await
                {
                    tracing::error!(
                        %request_uuid,
                        error = %release_err,
                        "Failed to release claim; row becomes claimable when the lease expires"
                    );
                }
                PollOutcome::Failed {
                    request_uuid: Some(request_uuid),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Poll on `interval` until `cancel` is triggered.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            lease_secs = self.lease_secs,
            "Queue worker started"
        );

        let mut ticker = poll_ticker(interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Queue worker stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.poll_and_process_one().await {
                        PollOutcome::Processed { request_uuid, character_id } => {
                            tracing::info!(%request_uuid, character_id, "Request processed");
                        }
                        PollOutcome::AlreadyProcessed { request_uuid } => {
                            tracing::warn!(%request_uuid, "Request was already processed elsewhere");
                        }
                        PollOutcome::Idle | PollOutcome::Failed { .. } => {}
                    }
                }
            }
        }
    }

    // ---- private helpers ----

    async fn process(&self, request: &QueuedRequest) -> Result<PollOutcome, WorkerError> {
        let generated = self
            .orchestrator
            .generate_character(&request.params())
            .await?;

        let input = NewCharacterRecord {
            character_data: serde_json::to_value(&generated.character)?,
            image_filename: generated.image_url.clone(),
            image_fetch_url: generated.image_fetch_url.clone(),
            user_id: request.user,
        };

        let Some(record) =
            CharacterRepo::insert_for_request(&self.pool, request.uuid, &input).await?
        else {
            return Ok(PollOutcome::AlreadyProcessed {
                request_uuid: request.uuid,
            });
        };

        tracing::info!(
            request_uuid = %request.uuid,
            character_id = record.id,
            name = %generated.character.name,
            "Character saved"
        );

        let notice = CharacterNotice {
            request_uuid: request.uuid,
            character_id: record.id,
            character_name: generated.character.name,
            image_url: generated.image_url,
        };
        self.notify(request.user, &notice).await;

        Ok(PollOutcome::Processed {
            request_uuid: request.uuid,
            character_id: record.id,
        })
    }

    /// Best-effort notifications; every failure is logged and swallowed.
    async fn notify(&self, user: RowUuid, notice: &CharacterNotice) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let contact = match ProfileRepo::find_contact(&self.pool, user).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                tracing::debug!(%user, "No profile for user, skipping notifications");
                return;
            }
            Err(e) => {
                tracing::warn!(%user, error = %e, "Profile lookup failed, skipping notifications");
                return;
            }
        };

        let report = notifier.character_ready(&contact, notice).await;
        tracing::info!(
            request_uuid = %notice.request_uuid,
            email = ?report.email,
            push = ?report.push,
            "Notifications dispatched"
        );
    }
}

/// Interval that keeps steady spacing after a long generation instead of
/// firing the missed ticks back to back.
fn poll_ticker(interval: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker
}
