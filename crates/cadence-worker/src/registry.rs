use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, WorkerError};
use crate::handler::JobHandler;

/// Static mapping from job name to handler, populated at startup.
///
/// Lookup is by exact key; an unknown name is a defined
/// [`WorkerError::HandlerNotFound`], never a reflective probe.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: &str, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Resolve the handler for a job name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn JobHandler>> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| WorkerError::HandlerNotFound {
                name: name.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
