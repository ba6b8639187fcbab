//! Completion notifications.
//!
//! - [`delivery`]: external channels (template email API, push API).
//! - [`NotificationDispatcher`]: sends both channels for a finished
//!   character and reports each result separately.
//!
//! Delivery is best-effort. Nothing here is allowed to fail a generation run.

pub mod config;
pub mod delivery;
pub mod dispatcher;

pub use config::NotificationConfig;
pub use delivery::email::{EmailConfig, TemplateEmailDelivery};
pub use delivery::push::{PushConfig, PushDelivery};
pub use delivery::DeliveryError;
pub use dispatcher::{ChannelStatus, CharacterNotice, DispatchReport, NotificationDispatcher, Notifier};
