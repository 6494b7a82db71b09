use std::str::FromStr;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use rusqlite::Connection;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::init_db;
use crate::error::Result;
use crate::types::{Job, JobStatus};

/// Eligibility predicate shared by every lease-path statement.
///
/// A job can be claimed when it is available, or when its lease has lapsed —
/// an expired lease is indistinguishable from a fresh job apart from the
/// retained `attempts` count. `?1` is always the current RFC3339 instant.
const ELIGIBLE: &str = "(status = 'available' OR (status = 'leased' AND lock_expires_at < ?1))";

/// Per-status job totals, for operator visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub available: u64,
    pub leased: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Durable job queue over a single SQLite connection.
///
/// Wraps the connection in a `Mutex`; multiple `JobStore` instances (one per
/// worker process) may point at the same database file — cross-instance
/// mutual exclusion comes from the guarded UPDATEs, not from this mutex.
pub struct JobStore {
    db: Mutex<Connection>,
    default_max_attempts: u32,
}

impl JobStore {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection, default_max_attempts: u32) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            default_max_attempts,
        })
    }

    /// Insert a new job with status `available` and zero attempts.
    #[instrument(skip(self, payload))]
    pub fn enqueue(&self, name: &str, payload: serde_json::Value) -> Result<String> {
        self.enqueue_with_max_attempts(name, payload, self.default_max_attempts)
    }

    /// As [`enqueue`](Self::enqueue), with a per-job attempt ceiling.
    pub fn enqueue_with_max_attempts(
        &self,
        name: &str,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let payload_json = serde_json::to_string(&payload)?;

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO jobs
             (id, name, payload, status, attempts, max_attempts, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'available', 0, ?4, ?5, ?5)",
            rusqlite::params![id, name, payload_json, max_attempts, now],
        )?;
        info!(job_id = %id, %name, "job enqueued");
        Ok(id)
    }

    /// Atomically claim one eligible job for `worker_identity`.
    ///
    /// The claim sets `lock_holder`, `lock_expires_at = now + lease` and
    /// increments `attempts`; selection and mutation are one guarded UPDATE,
    /// so under concurrent callers exactly one wins per job. A candidate
    /// whose incremented `attempts` would exceed its ceiling is transitioned
    /// to `failed` instead and the scan moves on. Returns `Ok(None)` when no
    /// eligible job exists.
    #[instrument(skip(self, lease))]
    pub fn try_lease(&self, worker_identity: &str, lease: Duration) -> Result<Option<Job>> {
        let db = self.db.lock().unwrap();
        loop {
            let now = Utc::now().to_rfc3339();
            let candidate = match db.query_row(
                &format!(
                    "SELECT id, attempts, max_attempts FROM jobs
                     WHERE {ELIGIBLE}
                     ORDER BY created_at, id LIMIT 1"
                ),
                rusqlite::params![now],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            ) {
                Ok(c) => c,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let (id, attempts, max_attempts) = candidate;

            if attempts + 1 > max_attempts {
                // Ceiling reached without completion: terminal, never leased again.
                let n = db.execute(
                    &format!(
                        "UPDATE jobs
                         SET status = 'failed', lock_holder = NULL, lock_expires_at = NULL,
                             updated_at = ?1
                         WHERE id = ?2 AND {ELIGIBLE}"
                    ),
                    rusqlite::params![now, id],
                )?;
                if n == 1 {
                    info!(job_id = %id, attempts, "attempts exhausted — job failed permanently");
                }
                continue;
            }

            let expires = (Utc::now() + lease).to_rfc3339();
            let n = db.execute(
                &format!(
                    "UPDATE jobs
                     SET status = 'leased', lock_holder = ?2, lock_expires_at = ?3,
                         attempts = attempts + 1, updated_at = ?1
                     WHERE id = ?4 AND {ELIGIBLE}"
                ),
                rusqlite::params![now, worker_identity, expires, id],
            )?;
            if n == 0 {
                // Lost the race to another store instance; rescan.
                debug!(job_id = %id, "lease race lost — retrying candidate scan");
                continue;
            }

            let job = db.query_row(
                "SELECT id, name, payload, status, attempts, max_attempts,
                        lock_holder, lock_expires_at, last_error, created_at, updated_at
                 FROM jobs WHERE id = ?1",
                rusqlite::params![id],
                row_to_job,
            )?;
            debug!(job_id = %job.id, name = %job.name, attempts = job.attempts, "job leased");
            return Ok(Some(job));
        }
    }

    /// Acknowledge successful execution.
    ///
    /// Succeeds only while `worker_identity` still holds the lease. A stale
    /// acknowledgement (lease expired and reassigned) returns `Ok(false)` and
    /// changes nothing — the guard against double-processing artifacts.
    #[instrument(skip(self))]
    pub fn ack_complete(&self, job_id: &str, worker_identity: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE jobs
             SET status = 'completed', lock_holder = NULL, lock_expires_at = NULL,
                 updated_at = ?1
             WHERE id = ?2 AND status = 'leased' AND lock_holder = ?3",
            rusqlite::params![now, job_id, worker_identity],
        )?;
        if n == 1 {
            info!(job_id, "job completed");
        } else {
            debug!(job_id, "stale ack_complete ignored");
        }
        Ok(n == 1)
    }

    /// Record a failed execution and release the lease immediately.
    ///
    /// The job returns to `available` while attempts remain, else it is
    /// failed permanently. Same ownership guard as [`ack_complete`](Self::ack_complete).
    #[instrument(skip(self, error))]
    pub fn ack_fail(&self, job_id: &str, worker_identity: &str, error: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE jobs
             SET status = CASE WHEN attempts >= max_attempts THEN 'failed' ELSE 'available' END,
                 lock_holder = NULL, lock_expires_at = NULL,
                 last_error = ?4, updated_at = ?1
             WHERE id = ?2 AND status = 'leased' AND lock_holder = ?3",
            rusqlite::params![now, job_id, worker_identity, error],
        )?;
        if n == 1 {
            info!(job_id, %error, "job execution failed");
        } else {
            debug!(job_id, "stale ack_fail ignored");
        }
        Ok(n == 1)
    }

    /// Fetch a job by id.
    pub fn get(&self, job_id: &str) -> Result<Option<Job>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT id, name, payload, status, attempts, max_attempts,
                    lock_holder, lock_expires_at, last_error, created_at, updated_at
             FROM jobs WHERE id = ?1",
            rusqlite::params![job_id],
            row_to_job,
        ) {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Per-status totals across the whole table.
    pub fn counts(&self) -> Result<StatusCounts> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")?;
        let mut counts = StatusCounts::default();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            match status.as_str() {
                "available" => counts.available = count as u64,
                "leased" => counts.leased = count as u64,
                "completed" => counts.completed = count as u64,
                "failed" => counts.failed = count as u64,
                _ => {}
            }
        }
        Ok(counts)
    }

    /// Most recently failed jobs, newest first.
    pub fn failed_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, name, payload, status, attempts, max_attempts,
                    lock_holder, lock_expires_at, last_error, created_at, updated_at
             FROM jobs WHERE status = 'failed'
             ORDER BY updated_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(rusqlite::params![limit as i64], row_to_job)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

/// Map a SQLite row to a `Job`.
fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let payload_json: String = row.get(2)?;
    let payload = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status_str: String = row.get(3)?;
    let status = JobStatus::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;

    Ok(Job {
        id: row.get(0)?,
        name: row.get(1)?,
        payload,
        status,
        attempts: row.get::<_, i64>(4)? as u32,
        max_attempts: row.get::<_, i64>(5)? as u32,
        lock_holder: row.get(6)?,
        lock_expires_at: row.get(7)?,
        last_error: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
