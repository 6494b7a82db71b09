use std::sync::Arc;

use tracing::instrument;

use crate::error::Result;
use crate::store::JobStore;

/// Appends new jobs to the store.
///
/// A deliberately thin pass-through: no internal retries, so a storage
/// failure surfaces to the caller of that submission attempt. Both the
/// scheduler engine and ad-hoc callers submit through this type.
#[derive(Clone)]
pub struct Producer {
    store: Arc<JobStore>,
}

impl Producer {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }

    /// Submit a job for execution. Returns the store-assigned job id.
    #[instrument(skip(self, payload))]
    pub fn submit(&self, name: &str, payload: serde_json::Value) -> Result<String> {
        self.store.enqueue(name, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn submit_enqueues_an_available_job() {
        let store =
            Arc::new(JobStore::new(Connection::open_in_memory().unwrap(), 3).unwrap());
        let producer = Producer::new(Arc::clone(&store));

        let id = producer
            .submit("send_report", serde_json::json!({"week": 34}))
            .unwrap();
        let job = store.get(&id).unwrap().unwrap();
        assert_eq!(job.name, "send_report");
        assert_eq!(job.attempts, 0);
        assert_eq!(job.payload["week"], 34);
    }
}
