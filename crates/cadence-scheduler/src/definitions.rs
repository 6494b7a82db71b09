use std::sync::Mutex;

use cadence_recurrence::definition::{join_list, ScheduleDefinition};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, SchedulerError};

/// A registered schedule with its firing target.
#[derive(Debug, Clone)]
pub struct ScheduleRecord {
    /// UUIDv7 string — primary key.
    pub id: String,
    /// Job name submitted when the schedule fires.
    pub name: String,
    /// Payload forwarded to the submitted job.
    pub payload: serde_json::Value,
    /// The recurrence rule.
    pub definition: ScheduleDefinition,
    /// Disabled schedules are skipped by the engine without deletion.
    pub enabled: bool,
    /// RFC3339 of the last fired occurrence (watermark), if any.
    pub last_fired_at: Option<String>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// RFC3339 timestamp of the last metadata update.
    pub updated_at: String,
}

/// Administrative handle for schedule definitions.
///
/// Uses its own `Connection` so registration and listing never contend with
/// the engine's polling queries. Definitions are validated here; a malformed
/// rule is rejected and never reaches occurrence computation.
pub struct ScheduleStore {
    db: Mutex<Connection>,
}

impl ScheduleStore {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Register a new schedule. Returns the fully populated record.
    pub fn add(
        &self,
        name: &str,
        payload: serde_json::Value,
        definition: ScheduleDefinition,
    ) -> Result<ScheduleRecord> {
        definition.validate()?;

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let payload_json = serde_json::to_string(&payload)?;

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO schedules
             (id, name, payload, start_date, days_or_weeks, months, days, hours, minutes,
              enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
            rusqlite::params![
                id,
                name,
                payload_json,
                definition.start_date,
                definition.mode.as_flag(),
                join_list(&definition.months),
                join_list(&definition.days),
                join_list(&definition.hours),
                join_list(&definition.minutes),
                now
            ],
        )?;
        info!(schedule_id = %id, %name, "schedule registered");

        Ok(ScheduleRecord {
            id,
            name: name.to_string(),
            payload,
            definition,
            enabled: true,
            last_fired_at: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Remove a schedule by ID. Returns `NotFound` if no row is deleted.
    pub fn remove(&self, id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute("DELETE FROM schedules WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(SchedulerError::NotFound { id: id.to_string() });
        }
        info!(schedule_id = %id, "schedule removed");
        Ok(())
    }

    /// Enable or disable a schedule without deleting it.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE schedules SET enabled = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![enabled, now, id],
        )?;
        if n == 0 {
            return Err(SchedulerError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Return all known schedules ordered by creation time.
    pub fn list(&self) -> Result<Vec<ScheduleRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, name, payload, start_date, days_or_weeks, months, days, hours, minutes,
                    enabled, last_fired_at, created_at, updated_at
             FROM schedules ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map([], row_to_raw)?
            .filter_map(|r| r.ok())
            .filter_map(|raw| raw.into_record().ok())
            .collect();
        Ok(rows)
    }
}

/// Raw row image, decoded into a record in a second step so one corrupt row
/// cannot poison a whole listing.
pub(crate) struct RawSchedule {
    pub id: String,
    pub name: String,
    pub payload: String,
    pub start_date: Option<i64>,
    pub days_or_weeks: i64,
    pub months: String,
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub enabled: bool,
    pub last_fired_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl RawSchedule {
    pub(crate) fn into_record(self) -> Result<ScheduleRecord> {
        let definition = ScheduleDefinition::from_parts(
            self.start_date,
            self.days_or_weeks as u8,
            &self.months,
            &self.days,
            &self.hours,
            &self.minutes,
        )?;
        Ok(ScheduleRecord {
            id: self.id,
            name: self.name,
            payload: serde_json::from_str(&self.payload)?,
            definition,
            enabled: self.enabled,
            last_fired_at: self.last_fired_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSchedule> {
    Ok(RawSchedule {
        id: row.get(0)?,
        name: row.get(1)?,
        payload: row.get(2)?,
        start_date: row.get(3)?,
        days_or_weeks: row.get(4)?,
        months: row.get(5)?,
        days: row.get(6)?,
        hours: row.get(7)?,
        minutes: row.get(8)?,
        enabled: row.get(9)?,
        last_fired_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_recurrence::ScheduleDefinition;

    fn store() -> ScheduleStore {
        ScheduleStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn weekday_definition() -> ScheduleDefinition {
        ScheduleDefinition::from_parts(None, 1, "0", "1,5", "0", "0").unwrap()
    }

    #[test]
    fn add_and_list_round_trip() {
        let store = store();
        let record = store
            .add("weekly_report", serde_json::json!({"team": "ops"}), weekday_definition())
            .unwrap();
        assert!(record.enabled);
        assert!(record.last_fired_at.is_none());

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "weekly_report");
        assert_eq!(listed[0].definition, weekday_definition());
    }

    #[test]
    fn malformed_definition_is_rejected_at_registration() {
        let store = store();
        let empty_days = ScheduleDefinition {
            days: Default::default(),
            ..weekday_definition()
        };
        let err = store.add("bad", serde_json::json!({}), empty_days);
        assert!(matches!(err, Err(SchedulerError::InvalidDefinition(_))));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn remove_missing_schedule_is_not_found() {
        let store = store();
        assert!(matches!(
            store.remove("no-such-id"),
            Err(SchedulerError::NotFound { .. })
        ));
    }

    #[test]
    fn set_enabled_toggles() {
        let store = store();
        let record = store
            .add("toggle", serde_json::json!({}), weekday_definition())
            .unwrap();
        store.set_enabled(&record.id, false).unwrap();
        assert!(!store.list().unwrap()[0].enabled);
    }
}
