//! Storage error shared by the repository traits, plus the bundled
//! in-memory store.

mod memory;

pub use memory::InMemoryAdmissionStore;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
