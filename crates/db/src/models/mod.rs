//! Row types and DTOs, one module per table.

pub mod character;
pub mod profile;
pub mod request;
