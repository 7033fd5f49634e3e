use thiserror::Error;

/// A dynamic error type for encapsulating low-level backend errors.
///
/// This type is used as the source for most [`StorageError`] variants to
/// allow wrapping backend errors uniformly.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that may occur while interacting with tracker storage.
///
/// This enum is used across all implementations of the storage traits.
/// Every variant is treated as retriable by the tracker; the dispatcher
/// pauses emission until the store recovers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read from the backend.
    #[error("storage read failed")]
    Read(#[source] SourceError),

    /// Failed to write to the backend.
    #[error("storage write failed")]
    Write(#[source] SourceError),

    /// The expected entry was not found in the backend.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The backend is temporarily unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] SourceError),
}
