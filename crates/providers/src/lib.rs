//! HTTP clients for the third-party generation providers.
//!
//! - [`text`]: completion API used for stat blocks and image prompts.
//! - [`image`]: diffusion API with asynchronous polling and an
//!   alternate-provider fallback.
//!
//! Both clients sit behind object-safe traits ([`TextGenerator`],
//! [`ImageGenerator`]) so the orchestrator can be driven by stand-ins.

pub mod config;
pub mod image;
pub mod text;

pub use config::ProviderConfig;
pub use image::{
    FetchStatus, ImageError, ImageGenerationClient, ImageGenerator, ImageOutcome, ImageProvider,
    PollPolicy,
};
pub use text::{ProviderError, TextGenerationClient, TextGenerator};
