use std::sync::Arc;

use cadence_core::config::QueueConfig;
use cadence_store::JobStore;
use chrono::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::handler::ExecutionError;
use crate::identity::ConsumerIdentity;
use crate::registry::HandlerRegistry;

/// One competing consumer loop.
///
/// Polls the store for a lease, dispatches through the registry and
/// acknowledges the outcome. Synchronisation with other workers happens
/// entirely inside [`JobStore::try_lease`]; between empty polls the worker
/// sleeps rather than blocking on the store.
pub struct Worker {
    store: Arc<JobStore>,
    registry: Arc<HandlerRegistry>,
    identity: ConsumerIdentity,
    lease: Duration,
    poll_interval: std::time::Duration,
}

impl Worker {
    pub fn new(
        store: Arc<JobStore>,
        registry: Arc<HandlerRegistry>,
        identity: ConsumerIdentity,
        queue: &QueueConfig,
    ) -> Self {
        Self {
            store,
            registry,
            identity,
            lease: Duration::seconds(queue.lease_secs as i64),
            poll_interval: std::time::Duration::from_secs(queue.poll_secs),
        }
    }

    /// Main loop. Polls until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(worker = %self.identity, "worker started");
        loop {
            tokio::select! {
                processed = self.step() => {
                    if !processed {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(worker = %self.identity, "worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One poll, with store faults logged rather than tearing the loop down.
    async fn step(&self) -> bool {
        match self.poll_once().await {
            Ok(processed) => processed,
            Err(e) => {
                error!(worker = %self.identity, "poll failed: {e}");
                false
            }
        }
    }

    /// Attempt to lease and execute one job.
    ///
    /// Returns `Ok(true)` when a job was claimed (whatever its outcome),
    /// `Ok(false)` when the queue had nothing eligible. Storage faults
    /// propagate to the caller.
    pub async fn poll_once(&self) -> Result<bool> {
        let Some(job) = self.store.try_lease(self.identity.as_str(), self.lease)? else {
            return Ok(false);
        };

        let handler = match self.registry.get(&job.name) {
            Ok(handler) => handler,
            Err(e) => {
                // An unroutable job is a job-level failure: it burns its
                // attempt budget and terminates instead of recycling forever.
                warn!(job_id = %job.id, name = %job.name, "{e}");
                self.store
                    .ack_fail(&job.id, self.identity.as_str(), &e.to_string())?;
                return Ok(true);
            }
        };

        match handler.run(&job.payload).await {
            Ok(()) => {
                if !self.store.ack_complete(&job.id, self.identity.as_str())? {
                    debug!(job_id = %job.id, "lease lapsed before completion — duplicate run absorbed");
                }
            }
            Err(ExecutionError::Executor(msg)) => {
                if !self.store.ack_fail(&job.id, self.identity.as_str(), &msg)? {
                    debug!(job_id = %job.id, "lease lapsed before failure ack — ignored");
                }
            }
            Err(ExecutionError::System(msg)) => {
                // Not the job's fault: hold the ack, let the lease expire and
                // the job re-run without a second attempt charged here.
                error!(job_id = %job.id, name = %job.name, "system failure during execution: {msg}");
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::JobHandler;
    use async_trait::async_trait;
    use cadence_store::JobStatus;
    use rusqlite::Connection;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl JobHandler for Recorder {
        async fn run(&self, payload: &serde_json::Value) -> std::result::Result<(), ExecutionError> {
            self.seen.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl JobHandler for Failing {
        async fn run(&self, _: &serde_json::Value) -> std::result::Result<(), ExecutionError> {
            Err(ExecutionError::Executor("simulated failure".into()))
        }
    }

    struct Broken;

    #[async_trait]
    impl JobHandler for Broken {
        async fn run(&self, _: &serde_json::Value) -> std::result::Result<(), ExecutionError> {
            Err(ExecutionError::System("database connection refused".into()))
        }
    }

    fn worker_with(registry: HandlerRegistry) -> (Worker, Arc<JobStore>) {
        let store =
            Arc::new(JobStore::new(Connection::open_in_memory().unwrap(), 3).unwrap());
        let worker = Worker::new(
            Arc::clone(&store),
            Arc::new(registry),
            ConsumerIdentity::new("test"),
            &QueueConfig::default(),
        );
        (worker, store)
    }

    #[tokio::test]
    async fn empty_queue_polls_false() {
        let (worker, _store) = worker_with(HandlerRegistry::new());
        assert!(!worker.poll_once().await.unwrap());
    }

    #[tokio::test]
    async fn successful_handler_completes_the_job() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let mut registry = HandlerRegistry::new();
        registry.register("greet", Arc::clone(&recorder) as Arc<dyn JobHandler>);
        let (worker, store) = worker_with(registry);

        let id = store
            .enqueue("greet", serde_json::json!({"who": "world"}))
            .unwrap();
        assert!(worker.poll_once().await.unwrap());

        assert_eq!(store.get(&id).unwrap().unwrap().status, JobStatus::Completed);
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["who"], "world");
    }

    #[tokio::test]
    async fn executor_failure_releases_for_retry() {
        let mut registry = HandlerRegistry::new();
        registry.register("flaky", Arc::new(Failing));
        let (worker, store) = worker_with(registry);

        let id = store.enqueue("flaky", serde_json::json!({})).unwrap();
        assert!(worker.poll_once().await.unwrap());

        let job = store.get(&id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Available);
        assert_eq!(job.attempts, 1);
        assert_eq!(job.last_error.as_deref(), Some("simulated failure"));
    }

    #[tokio::test]
    async fn repeated_executor_failures_exhaust_the_job() {
        let mut registry = HandlerRegistry::new();
        registry.register("flaky", Arc::new(Failing));
        let (worker, store) = worker_with(registry);

        let id = store.enqueue("flaky", serde_json::json!({})).unwrap();
        for _ in 0..3 {
            assert!(worker.poll_once().await.unwrap());
        }
        assert!(!worker.poll_once().await.unwrap(), "failed job must not be leased");
        assert_eq!(store.get(&id).unwrap().unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn unregistered_name_burns_attempts() {
        let (worker, store) = worker_with(HandlerRegistry::new());
        let id = store.enqueue("nobody_home", serde_json::json!({})).unwrap();

        assert!(worker.poll_once().await.unwrap());
        let job = store.get(&id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Available);
        assert!(job
            .last_error
            .as_deref()
            .unwrap()
            .contains("nobody_home"));
    }

    #[tokio::test]
    async fn system_failure_keeps_the_lease() {
        let mut registry = HandlerRegistry::new();
        registry.register("outage", Arc::new(Broken));
        let (worker, store) = worker_with(registry);

        let id = store.enqueue("outage", serde_json::json!({})).unwrap();
        assert!(worker.poll_once().await.unwrap());

        // No ack was sent: the job is still leased and recovers by expiry.
        let job = store.get(&id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Leased);
        assert_eq!(job.attempts, 1);
        assert!(job.last_error.is_none());
    }
}
