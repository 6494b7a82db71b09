use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::definition::{ScheduleDefinition, ScheduleMode};

/// Compute the next fire instant for `definition`, strictly after `now`.
///
/// The effective start is `start_date + 1` second when a start date is set
/// (the stored boundary behavior — see DESIGN.md), otherwise `now` itself.
/// Returns `None` when the schedule can never fire again (e.g. day-of-month
/// 31 restricted to 30-day months) or when the definition fails to render,
/// which validation upstream should have prevented.
pub fn next_occurrence(
    definition: &ScheduleDefinition,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let expr = parser_expression(definition);
    let schedule = match cron::Schedule::from_str(&expr) {
        Ok(s) => s,
        Err(e) => {
            warn!(%expr, "unrenderable schedule definition: {e}");
            return None;
        }
    };

    let after = match definition.start_date {
        Some(epoch) => {
            let start = DateTime::<Utc>::from_timestamp(epoch, 0)? + Duration::seconds(1);
            start.max(now)
        }
        None => now,
    };

    schedule.after(&after).next()
}

/// Render the six-field expression the `cron` parser expects.
///
/// Differences from the public five-field text: a leading `0` seconds field,
/// and day-of-week shifted to the parser's 1–7 numbering (1 = Sunday).
/// Day-of-month and month are 1-based in both forms.
fn parser_expression(definition: &ScheduleDefinition) -> String {
    let join = |set: &std::collections::BTreeSet<u8>, offset: u8| {
        set.iter()
            .map(|v| (v + offset).to_string())
            .collect::<Vec<_>>()
            .join(",")
    };

    let (day_of_month, day_of_week) = match definition.mode {
        ScheduleMode::DayOfWeek => ("*".to_string(), join(&definition.days, 1)),
        ScheduleMode::DayOfMonth => (join(&definition.days, 1), "*".to_string()),
    };

    format!(
        "0 {} {} {} {} {}",
        join(&definition.minutes, 0),
        join(&definition.hours, 0),
        day_of_month,
        join(&definition.months, 1),
        day_of_week,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn occurrence_is_strictly_after_reference() {
        // 1st and 15th of January and June at 09:00
        let def = ScheduleDefinition::from_parts(None, 0, "0,5", "0,14", "9", "0").unwrap();

        let probes = [
            utc(2026, 1, 1, 8, 59, 59),
            utc(2026, 1, 1, 9, 0, 0), // exactly a fire instant
            utc(2026, 6, 15, 9, 0, 0),
            utc(2026, 12, 31, 23, 59, 59),
        ];
        for now in probes {
            let next = next_occurrence(&def, now).expect("schedule exhausted");
            assert!(next > now, "{next} not strictly after {now}");
        }
    }

    #[test]
    fn day_of_month_schedule_fires_on_translated_days() {
        let def = ScheduleDefinition::from_parts(None, 0, "0,5", "0,14", "9", "0").unwrap();
        let next = next_occurrence(&def, utc(2026, 1, 5, 0, 0, 0)).unwrap();
        assert_eq!(next, utc(2026, 1, 15, 9, 0, 0));
    }

    #[test]
    fn weekday_schedule_uses_sunday_zero_numbering() {
        // Monday and Friday (1, 5 with 0=Sunday) in January at midnight.
        let def = ScheduleDefinition::from_parts(None, 1, "0", "1,5", "0", "0").unwrap();
        // 2026-01-01 is a Thursday; the next listed weekday is Friday the 2nd.
        let next = next_occurrence(&def, utc(2026, 1, 1, 12, 0, 0)).unwrap();
        assert_eq!(next, utc(2026, 1, 2, 0, 0, 0));
    }

    #[test]
    fn sunday_and_saturday_round_trip() {
        // 0=Sunday, 6=Saturday.
        let def = ScheduleDefinition::from_parts(None, 1, "0", "0,6", "12", "30").unwrap();
        // 2026-01-05 is a Monday; next fire is Saturday the 10th.
        let next = next_occurrence(&def, utc(2026, 1, 5, 0, 0, 0)).unwrap();
        assert_eq!(next, utc(2026, 1, 10, 12, 30, 0));
    }

    #[test]
    fn start_date_shifts_first_eligible_instant_by_one_second() {
        // Fires every January 1st at 00:00.
        let start = utc(2026, 1, 1, 0, 0, 0);
        let def = ScheduleDefinition::from_parts(
            Some(start.timestamp()),
            0,
            "0",
            "0",
            "0",
            "0",
        )
        .unwrap();

        // Without a start date the 2026 instant is next.
        let unrestricted = ScheduleDefinition {
            start_date: None,
            ..def.clone()
        };
        let now = utc(2025, 6, 1, 0, 0, 0);
        assert_eq!(next_occurrence(&unrestricted, now).unwrap(), start);

        // With start_date at that very instant, the +1 s offset pushes the
        // first eligible instant past it: next fire is 2027.
        assert_eq!(
            next_occurrence(&def, now).unwrap(),
            utc(2027, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn past_start_date_defers_to_now() {
        let def = ScheduleDefinition::from_parts(
            Some(utc(2020, 1, 1, 0, 0, 0).timestamp()),
            0,
            "0",
            "0",
            "9",
            "0",
        )
        .unwrap();
        let now = utc(2026, 3, 1, 0, 0, 0);
        assert_eq!(next_occurrence(&def, now).unwrap(), utc(2027, 1, 1, 9, 0, 0));
    }

    #[test]
    fn determinism() {
        let def = ScheduleDefinition::from_parts(None, 1, "0,6", "2", "8", "0,30").unwrap();
        let now = utc(2026, 2, 10, 3, 0, 0);
        assert_eq!(next_occurrence(&def, now), next_occurrence(&def, now));
    }
}
