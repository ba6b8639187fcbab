//! Bestiary domain core.
//!
//! Pure, I/O-free building blocks shared by every other crate:
//!
//! - [`character`]: the generated creature entity and its construction
//!   from loosely-structured model output.
//! - [`parse`]: tolerant JSON extraction and case-insensitive field lookup.
//! - [`prompt`]: prompt text for the character and image-description calls.
//! - [`request`]: generation parameters carried by a queued request.

pub mod character;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod request;
pub mod types;
