//! Email notifications via a transactional template API.
//!
//! [`TemplateEmailDelivery`] posts `{from, to, template_id, template_data}`
//! to the configured endpoint; the provider renders the template. If
//! `EMAIL_API_URL` is not set, [`EmailConfig::from_env`] returns `None` and
//! no mailer should be constructed.

use super::{http_client, post_json, DeliveryError};

/// Default sender address when `EMAIL_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@bestiary.local";

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Configuration for the template email API.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Endpoint that accepts template send requests.
    pub api_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Sender address.
    pub from_address: String,
    /// Template used for "character ready" emails.
    pub template_id: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable            | Required | Default                  |
    /// |---------------------|----------|--------------------------|
    /// | `EMAIL_API_URL`     | yes      |                          |
    /// | `EMAIL_TEMPLATE_ID` | yes      |                          |
    /// | `EMAIL_API_KEY`     | no       |                          |
    /// | `EMAIL_FROM`        | no       | `noreply@bestiary.local` |
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("EMAIL_API_URL").ok()?;
        let template_id = std::env::var("EMAIL_TEMPLATE_ID").ok()?;
        Some(Self {
            api_url,
            api_key: std::env::var("EMAIL_API_KEY").ok(),
            from_address: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            template_id,
        })
    }
}

// ---------------------------------------------------------------------------
// TemplateEmailDelivery
// ---------------------------------------------------------------------------

/// Sends templated emails through the provider's HTTP API.
pub struct TemplateEmailDelivery {
    client: reqwest::Client,
    config: EmailConfig,
}

impl TemplateEmailDelivery {
    pub fn new(config: EmailConfig) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client()?,
            config,
        })
    }

    /// Template configured for completion emails.
    pub fn default_template(&self) -> &str {
        &self.config.template_id
    }

    /// Send `template_id` to `to`, filling the template with `data`.
    pub async fn send(
        &self,
        to: &str,
        template_id: &str,
        data: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "from": self.config.from_address,
            "to": to,
            "template_id": template_id,
            "template_data": data,
        });

        post_json(
            &self.client,
            &self.config.api_url,
            self.config.api_key.as_deref(),
            &payload,
        )
        .await?;

        tracing::info!(to, template_id, "Notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_returns_none_without_api_url() {
        std::env::remove_var("EMAIL_API_URL");
        assert!(EmailConfig::from_env().is_none());
    }
}
