use cadence_recurrence::next_occurrence;
use cadence_store::Producer;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::db::init_db;
use crate::definitions::row_to_raw;
use crate::error::Result;

/// Evaluates enabled schedules and submits due jobs through the producer.
///
/// Single logical loop; the fire-once guard is the conditional watermark
/// UPDATE in [`claim`](SchedulerEngine::tick_at), keyed by (schedule id,
/// occurrence instant), so overlapping ticks or a second engine instance
/// cannot double-fire an occurrence.
pub struct SchedulerEngine {
    conn: Connection,
    producer: Producer,
    tick_interval: std::time::Duration,
}

impl SchedulerEngine {
    /// Create a new engine, initialising the DB schema if needed.
    pub fn new(conn: Connection, producer: Producer, tick_secs: u64) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn,
            producer,
            tick_interval: std::time::Duration::from_secs(tick_secs),
        })
    }

    /// Main event loop. Ticks at the configured interval until `shutdown`
    /// broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick() {
                        error!("scheduler tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Evaluate all enabled schedules against the current time.
    pub fn tick(&mut self) -> Result<usize> {
        self.tick_at(Utc::now())
    }

    /// Evaluate all enabled schedules against `now`. Returns the number of
    /// occurrences fired.
    ///
    /// Rows whose stored definition no longer parses are skipped with an
    /// error log; they never take the loop down.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let raws = {
            let mut stmt = self.conn.prepare_cached(
                "SELECT id, name, payload, start_date, days_or_weeks, months, days, hours,
                        minutes, enabled, last_fired_at, created_at, updated_at
                 FROM schedules WHERE enabled = 1",
            )?;
            let rows: Vec<_> = stmt.query_map([], row_to_raw)?.filter_map(|r| r.ok()).collect();
            rows
        };

        let mut fired = 0;
        for raw in raws {
            let id = raw.id.clone();
            let last_fired_at = raw.last_fired_at.clone();
            let created_at = raw.created_at.clone();
            let record = match raw.into_record() {
                Ok(r) => r,
                Err(e) => {
                    error!(schedule_id = %id, "bad schedule row skipped: {e}");
                    continue;
                }
            };

            // Watermark is the reference instant: occurrences strictly after
            // the last fire, falling back to registration time.
            let reference = last_fired_at
                .as_deref()
                .or(Some(created_at.as_str()))
                .and_then(parse_rfc3339)
                .unwrap_or(now);

            let Some(occurrence) = next_occurrence(&record.definition, reference) else {
                debug!(schedule_id = %id, "schedule has no future occurrence");
                continue;
            };
            if occurrence > now {
                continue;
            }

            if !self.claim(&id, occurrence, now)? {
                // Another tick or engine instance already fired this occurrence.
                debug!(schedule_id = %id, %occurrence, "occurrence already claimed");
                continue;
            }

            match self.producer.submit(&record.name, record.payload.clone()) {
                Ok(job_id) => {
                    fired += 1;
                    info!(
                        schedule_id = %id,
                        name = %record.name,
                        %occurrence,
                        %job_id,
                        "schedule fired"
                    );
                }
                Err(e) => {
                    // The occurrence is already claimed; dropping it beats
                    // risking a double fire (see DESIGN.md).
                    error!(schedule_id = %id, %occurrence, "submit failed, occurrence dropped: {e}");
                }
            }
        }
        Ok(fired)
    }

    /// Idempotent-fire guard: advance the watermark to `occurrence` only if
    /// it still lies beyond the stored one. `true` means this caller owns
    /// the fire.
    fn claim(&self, id: &str, occurrence: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE schedules SET last_fired_at = ?1, updated_at = ?2
             WHERE id = ?3 AND enabled = 1
               AND (last_fired_at IS NULL OR last_fired_at < ?1)",
            rusqlite::params![occurrence.to_rfc3339(), now.to_rfc3339(), id],
        )?;
        Ok(n == 1)
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
