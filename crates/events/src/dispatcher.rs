//! Fan-out of a "character ready" notice to every configured channel.

use async_trait::async_trait;
use bestiary_core::types::{DbId, RowUuid};
use bestiary_db::models::profile::ContactDetails;

use crate::config::NotificationConfig;
use crate::delivery::email::TemplateEmailDelivery;
use crate::delivery::push::PushDelivery;
use crate::delivery::DeliveryError;

/// Heading shown on the push notification.
const PUSH_HEADING: &str = "Your character is ready";

/// What was generated, for templating.
#[derive(Debug, Clone)]
pub struct CharacterNotice {
    pub request_uuid: RowUuid,
    pub character_id: DbId,
    pub character_name: String,
    pub image_url: String,
}

/// Result of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Sent,
    /// Channel not configured, or the user has no address for it.
    Skipped,
    Failed(String),
}

/// Per-channel outcome of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub email: ChannelStatus,
    pub push: ChannelStatus,
}

impl DispatchReport {
    pub fn skipped() -> Self {
        Self {
            email: ChannelStatus::Skipped,
            push: ChannelStatus::Skipped,
        }
    }
}

/// Anything that can tell a user their character is ready.
///
/// Implementations must not fail; problems are reported in the returned
/// [`DispatchReport`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn character_ready(
        &self,
        contact: &ContactDetails,
        notice: &CharacterNotice,
    ) -> DispatchReport;
}

/// Sends the email and push notifications for a finished character.
pub struct NotificationDispatcher {
    email: Option<TemplateEmailDelivery>,
    push: Option<PushDelivery>,
}

impl NotificationDispatcher {
    pub fn new(email: Option<TemplateEmailDelivery>, push: Option<PushDelivery>) -> Self {
        Self { email, push }
    }

    /// Build delivery channels for every configured section.
    pub fn from_config(config: NotificationConfig) -> Result<Self, DeliveryError> {
        let email = config.email.map(TemplateEmailDelivery::new).transpose()?;
        let push = config.push.map(PushDelivery::new).transpose()?;
        Ok(Self::new(email, push))
    }

    async fn send_email(&self, contact: &ContactDetails, notice: &CharacterNotice) -> ChannelStatus {
        let (Some(delivery), Some(to)) = (&self.email, contact.email.as_deref()) else {
            return ChannelStatus::Skipped;
        };

        let data = serde_json::json!({
            "display_name": contact.display_name,
            "character_name": notice.character_name,
            "character_id": notice.character_id,
            "image_url": notice.image_url,
        });

        match delivery.send(to, delivery.default_template(), &data).await {
            Ok(()) => ChannelStatus::Sent,
            Err(e) => {
                tracing::warn!(
                    request_uuid = %notice.request_uuid,
                    error = %e,
                    "Completion email failed"
                );
                ChannelStatus::Failed(e.to_string())
            }
        }
    }

    async fn send_push(&self, contact: &ContactDetails, notice: &CharacterNotice) -> ChannelStatus {
        let (Some(delivery), Some(external_id)) =
            (&self.push, contact.notification_external_id.as_deref())
        else {
            return ChannelStatus::Skipped;
        };

        let message = format!("{} has been created.", notice.character_name);
        let data = serde_json::json!({
            "character_id": notice.character_id,
            "request_uuid": notice.request_uuid,
        });

        match delivery.send(external_id, PUSH_HEADING, &message, &data).await {
            Ok(()) => ChannelStatus::Sent,
            Err(e) => {
                tracing::warn!(
                    request_uuid = %notice.request_uuid,
                    error = %e,
                    "Push notification failed"
                );
                ChannelStatus::Failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn character_ready(
        &self,
        contact: &ContactDetails,
        notice: &CharacterNotice,
    ) -> DispatchReport {
        let (email, push) = tokio::join!(
            self.send_email(contact, notice),
            self.send_push(contact, notice)
        );
        DispatchReport { email, push }
    }
}
