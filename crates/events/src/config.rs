use crate::delivery::email::EmailConfig;
use crate::delivery::push::PushConfig;

/// Settings for every notification channel.
///
/// Each channel is configured independently; a missing channel is skipped.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub email: Option<EmailConfig>,
    pub push: Option<PushConfig>,
}

impl NotificationConfig {
    /// Load channel settings from the environment.
    ///
    /// Returns `None` when no channel is configured, signalling that
    /// notifications should be skipped entirely.
    pub fn from_env() -> Option<Self> {
        let config = Self {
            email: EmailConfig::from_env(),
            push: PushConfig::from_env(),
        };
        if config.email.is_none() && config.push.is_none() {
            return None;
        }
        Some(config)
    }
}
