//! Character generation pipeline.
//!
//! [`CharacterOrchestrator`] drives one generation end to end: stat-block
//! prompt, tolerant parse with bounded retry, character construction, image
//! prompt refinement, and image generation. Persistence is the caller's job.

pub mod error;
pub mod orchestrator;

pub use error::PipelineError;
pub use orchestrator::{CharacterOrchestrator, GeneratedCharacter, OrchestratorConfig};
