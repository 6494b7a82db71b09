use std::sync::Arc;
use std::time::Duration;

use cadence_core::CadenceConfig;
use cadence_scheduler::SchedulerEngine;
use cadence_store::{db, JobStore, Producer};
use cadence_worker::{ConsumerIdentity, HandlerRegistry, Worker};
use tracing::info;

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info".into()),
        )
        .init();

    // load config: explicit path via CADENCE_CONFIG env > ~/.cadence/cadence.toml
    let config_path = std::env::var("CADENCE_CONFIG").ok();
    let config = CadenceConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        CadenceConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    // run all schema migrations up front (idempotent)
    let conn = db::open(db_path)?;
    cadence_store::db::init_db(&conn)?;
    cadence_scheduler::db::init_db(&conn)?;
    drop(conn);
    info!("database migrations complete");

    // build subsystems — each gets its own connection for thread safety
    let store = Arc::new(JobStore::new(db::open(db_path)?, config.queue.max_attempts)?);
    let producer = Producer::new(Arc::clone(&store));

    let mut registry = HandlerRegistry::new();
    handlers::register_builtins(&mut registry);
    let registry = Arc::new(registry);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // scheduler engine loop in the background
    let engine = SchedulerEngine::new(db::open(db_path)?, producer, config.scheduler.tick_secs)?;
    tokio::spawn(engine.run(shutdown_rx.clone()));

    // one competing worker loop per configured slot
    for _ in 0..config.worker.count {
        let worker_store = Arc::new(JobStore::new(db::open(db_path)?, config.queue.max_attempts)?);
        let worker = Worker::new(
            worker_store,
            Arc::clone(&registry),
            ConsumerIdentity::new(&config.worker.identity_prefix),
            &config.queue,
        );
        tokio::spawn(worker.run(shutdown_rx.clone()));
    }
    info!(workers = config.worker.count, "cadence daemon running");

    // periodic queue stats for operators
    let stats_store = Arc::clone(&store);
    let mut stats_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match stats_store.counts() {
                        Ok(c) => info!(
                            available = c.available,
                            leased = c.leased,
                            completed = c.completed,
                            failed = c.failed,
                            "queue stats"
                        ),
                        Err(e) => tracing::warn!("queue stats query failed: {e}"),
                    }
                }
                _ = stats_shutdown.changed() => {
                    if *stats_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
