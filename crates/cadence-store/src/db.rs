use rusqlite::Connection;

use crate::error::Result;

/// Open a connection with the pragmas every cadence component uses.
///
/// WAL allows the scheduler, workers and administrative tooling to share the
/// database file; the busy timeout absorbs short write contention instead of
/// surfacing SQLITE_BUSY to callers.
pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}

/// Initialise the queue schema in `conn`.
///
/// Creates the `jobs` table (idempotent) and an index covering the lease
/// candidate scan, so `try_lease` stays efficient with a deep backlog.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id              TEXT    NOT NULL PRIMARY KEY,
            name            TEXT    NOT NULL,
            payload         TEXT    NOT NULL,   -- opaque JSON, passed to handlers unchanged
            status          TEXT    NOT NULL DEFAULT 'available',
            attempts        INTEGER NOT NULL DEFAULT 0,
            max_attempts    INTEGER NOT NULL,
            lock_holder     TEXT,               -- worker identity or NULL
            lock_expires_at TEXT,               -- ISO-8601 or NULL
            last_error      TEXT,
            created_at      TEXT    NOT NULL,
            updated_at      TEXT    NOT NULL
        ) STRICT;

        -- Candidate scan: WHERE status = 'available' OR (status = 'leased' AND lock_expires_at < now)
        CREATE INDEX IF NOT EXISTS idx_jobs_lease ON jobs (status, lock_expires_at, created_at);
        ",
    )?;
    Ok(())
}
