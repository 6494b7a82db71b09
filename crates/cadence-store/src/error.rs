use thiserror::Error;

/// Errors surfaced by the job store.
///
/// Contention between workers is never an error: a lost lease race or a
/// stale acknowledgement comes back as `Ok(None)` / `Ok(false)` from the
/// store operations themselves.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error. Fatal to the calling component.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
