use async_trait::async_trait;
use thiserror::Error;

/// Discriminated execution outcome.
///
/// Only `Executor` failures feed the retry policy (`ack_fail`); `System`
/// failures are infrastructure faults — the worker leaves the lease to
/// expire and surfaces the error instead of charging the job an extra
/// failed attempt.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The job's business logic failed; retry per the job's attempt budget.
    #[error("executor failure: {0}")]
    Executor(String),

    /// The environment failed (network, disk, downstream outage); not a
    /// verdict on the job itself.
    #[error("system failure: {0}")]
    System(String),
}

/// A job executor, registered under a job name.
///
/// Receives the payload unchanged from the producer. Implementations must be
/// idempotent: under lease expiry the same payload can be delivered twice.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, payload: &serde_json::Value) -> Result<(), ExecutionError>;
}
