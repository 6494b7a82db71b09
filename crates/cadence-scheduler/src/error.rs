use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The definition failed validation at registration time.
    #[error("Invalid schedule definition: {0}")]
    InvalidDefinition(#[from] cadence_recurrence::RecurrenceError),

    /// No schedule with the given ID exists.
    #[error("Schedule not found: {id}")]
    NotFound { id: String },

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
