//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod character_repo;
pub mod profile_repo;
pub mod request_repo;

pub use character_repo::CharacterRepo;
pub use profile_repo::ProfileRepo;
pub use request_repo::RequestRepo;
