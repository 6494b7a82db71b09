use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Storage fault — fatal to the current poll, surfaced to the loop.
    #[error("Store error: {0}")]
    Store(#[from] cadence_store::StoreError),

    /// No handler was registered for the job's name.
    #[error("No handler registered for job '{name}'")]
    HandlerNotFound { name: String },
}

pub type Result<T> = std::result::Result<T, WorkerError>;
