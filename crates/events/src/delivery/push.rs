//! Push notifications addressed by external user id.

use super::{http_client, post_json, DeliveryError};

/// Configuration for the push notification API.
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Application the notification is sent on behalf of.
    pub app_id: String,
}

impl PushConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable       | Required |
    /// |----------------|----------|
    /// | `PUSH_API_URL` | yes      |
    /// | `PUSH_APP_ID`  | yes      |
    /// | `PUSH_API_KEY` | no       |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_url: std::env::var("PUSH_API_URL").ok()?,
            app_id: std::env::var("PUSH_APP_ID").ok()?,
            api_key: std::env::var("PUSH_API_KEY").ok(),
        })
    }
}

/// Sends push notifications through the provider's HTTP API.
pub struct PushDelivery {
    client: reqwest::Client,
    config: PushConfig,
}

impl PushDelivery {
    pub fn new(config: PushConfig) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client()?,
            config,
        })
    }

    /// Notify one user. `heading` and `message` are sent as English text.
    pub async fn send(
        &self,
        external_user_id: &str,
        heading: &str,
        message: &str,
        data: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "app_id": self.config.app_id,
            "include_external_user_ids": [external_user_id],
            "headings": { "en": heading },
            "contents": { "en": message },
            "data": data,
        });

        post_json(
            &self.client,
            &self.config.api_url,
            self.config.api_key.as_deref(),
            &payload,
        )
        .await?;

        tracing::info!(external_user_id, "Push notification sent");
        Ok(())
    }
}
