use std::sync::Arc;

use async_trait::async_trait;
use cadence_worker::{ExecutionError, HandlerRegistry, JobHandler};
use tracing::info;

/// Register the daemon's built-in handlers.
///
/// Real deployments embed cadence as a library and register their own
/// handlers; the daemon ships `log` so a fresh install has something
/// routable to smoke-test the queue with.
pub fn register_builtins(registry: &mut HandlerRegistry) {
    registry.register("log", Arc::new(LogHandler));
}

/// Writes the job payload to the daemon log and succeeds.
struct LogHandler;

#[async_trait]
impl JobHandler for LogHandler {
    async fn run(&self, payload: &serde_json::Value) -> Result<(), ExecutionError> {
        info!(%payload, "log job executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let mut registry = HandlerRegistry::new();
        register_builtins(&mut registry);
        assert!(registry.get("log").is_ok());
    }
}
