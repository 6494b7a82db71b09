use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// Which day semantics the `days` set carries.
///
/// Exactly one day interpretation is active per definition; the inactive one
/// is treated as "every" (cron wildcard) during translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// `days` are weekdays: 0 = Sunday … 6 = Saturday.
    DayOfWeek,
    /// `days` are days of the month: 0 = first … 30 = thirty-first.
    DayOfMonth,
}

impl ScheduleMode {
    /// Decode the external `days_or_weeks` flag (0 = month-days, 1 = weekdays).
    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0 => Ok(ScheduleMode::DayOfMonth),
            1 => Ok(ScheduleMode::DayOfWeek),
            other => Err(RecurrenceError::InvalidDefinition(format!(
                "days_or_weeks flag must be 0 or 1, got {other}"
            ))),
        }
    }

    /// Encode back to the external `days_or_weeks` flag.
    pub fn as_flag(&self) -> u8 {
        match self {
            ScheduleMode::DayOfMonth => 0,
            ScheduleMode::DayOfWeek => 1,
        }
    }
}

/// A stored recurrence rule.
///
/// All sets are 0-based in storage; translation to cron text shifts months
/// and month-days to the 1-based cron convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDefinition {
    /// Optional epoch seconds. When present, the first eligible instant is
    /// `start_date + 1` second. When absent, the rule is active from "now".
    pub start_date: Option<i64>,
    /// Day semantics for the `days` set.
    pub mode: ScheduleMode,
    /// 0 = January … 11 = December.
    pub months: BTreeSet<u8>,
    /// Weekdays or month-days depending on `mode`.
    pub days: BTreeSet<u8>,
    /// Hours of day, 0–23.
    pub hours: BTreeSet<u8>,
    /// Minutes of hour, 0–59.
    pub minutes: BTreeSet<u8>,
}

impl ScheduleDefinition {
    /// Build a definition from its external representation: the
    /// `days_or_weeks` flag plus comma-joined 0-based integer lists.
    ///
    /// The result is validated; malformed definitions are rejected here and
    /// never reach occurrence computation.
    pub fn from_parts(
        start_date: Option<i64>,
        days_or_weeks: u8,
        months: &str,
        days: &str,
        hours: &str,
        minutes: &str,
    ) -> Result<Self> {
        let definition = Self {
            start_date,
            mode: ScheduleMode::from_flag(days_or_weeks)?,
            months: parse_list(months)?,
            days: parse_list(days)?,
            hours: parse_list(hours)?,
            minutes: parse_list(minutes)?,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Check set bounds and non-emptiness.
    pub fn validate(&self) -> Result<()> {
        check_set("months", &self.months, 11)?;
        check_set("hours", &self.hours, 23)?;
        check_set("minutes", &self.minutes, 59)?;
        match self.mode {
            ScheduleMode::DayOfWeek => check_set("days (weekday)", &self.days, 6),
            ScheduleMode::DayOfMonth => check_set("days (day-of-month)", &self.days, 30),
        }
    }
}

fn check_set(field: &str, set: &BTreeSet<u8>, max: u8) -> Result<()> {
    if set.is_empty() {
        return Err(RecurrenceError::InvalidDefinition(format!(
            "{field} must not be empty"
        )));
    }
    if let Some(out) = set.iter().find(|v| **v > max) {
        return Err(RecurrenceError::InvalidDefinition(format!(
            "{field} value {out} exceeds maximum {max}"
        )));
    }
    Ok(())
}

/// Parse a comma-joined integer list ("0,14") into an ordered set.
pub fn parse_list(list: &str) -> Result<BTreeSet<u8>> {
    let mut set = BTreeSet::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let value: u8 = part.parse().map_err(|e| RecurrenceError::InvalidList {
            list: list.to_string(),
            reason: format!("'{part}': {e}"),
        })?;
        set.insert(value);
    }
    Ok(set)
}

/// Render an ordered set back to the comma-joined external form.
pub fn join_list(set: &BTreeSet<u8>) -> String {
    set.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
