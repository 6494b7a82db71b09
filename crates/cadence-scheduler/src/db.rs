use rusqlite::Connection;

use crate::error::Result;

/// Initialise the scheduler schema in `conn`.
///
/// Creates the `schedules` table (idempotent). Recurrence fields keep the
/// external 0-based comma-list representation; `last_fired_at` is both the
/// catch-up watermark and the fire-once guard column.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schedules (
            id            TEXT    NOT NULL PRIMARY KEY,
            name          TEXT    NOT NULL,   -- job name submitted on fire
            payload       TEXT    NOT NULL,   -- opaque JSON payload
            start_date    INTEGER,            -- epoch seconds or NULL
            days_or_weeks INTEGER NOT NULL,   -- 0 = month-days, 1 = weekdays
            months        TEXT    NOT NULL,   -- comma-joined 0-based indices
            days          TEXT    NOT NULL,
            hours         TEXT    NOT NULL,
            minutes       TEXT    NOT NULL,
            enabled       INTEGER NOT NULL DEFAULT 1,
            last_fired_at TEXT,               -- ISO-8601 or NULL
            created_at    TEXT    NOT NULL,
            updated_at    TEXT    NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}
