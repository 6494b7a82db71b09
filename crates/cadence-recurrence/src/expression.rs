use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::definition::{ScheduleDefinition, ScheduleMode};

/// A five-field cron expression: `minute hour day-of-month month day-of-week`.
///
/// Each field is a comma-joined list of integers or `*`. Minutes and hours
/// are emitted verbatim; day-of-month and month are 1-based per the cron
/// convention; day-of-week keeps the 0=Sunday…6=Saturday numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronExpression {
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
}

impl std::fmt::Display for CronExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }
}

/// Translate a stored definition into its cron-expression form.
pub fn translate(definition: &ScheduleDefinition) -> CronExpression {
    let (day_of_month, day_of_week) = match definition.mode {
        // Weekday values pass through unchanged (cron is also 0=Sunday).
        ScheduleMode::DayOfWeek => ("*".to_string(), join(&definition.days, 0)),
        // Month-days shift from 0-based storage to cron's 1-based field.
        ScheduleMode::DayOfMonth => (join(&definition.days, 1), "*".to_string()),
    };

    CronExpression {
        minute: join(&definition.minutes, 0),
        hour: join(&definition.hours, 0),
        day_of_month,
        // 0=January in storage, 1=January in cron.
        month: join(&definition.months, 1),
        day_of_week,
    }
}

fn join(set: &BTreeSet<u8>, offset: u8) -> String {
    set.iter()
        .map(|v| (v + offset).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ScheduleDefinition;

    #[test]
    fn day_of_month_mode_shifts_days_and_months() {
        let def = ScheduleDefinition::from_parts(None, 0, "0,5", "0,14", "9", "0").unwrap();
        let expr = translate(&def);
        assert_eq!(expr.to_string(), "0 9 1,15 1,6 *");
    }

    #[test]
    fn day_of_week_mode_keeps_days_verbatim() {
        let def = ScheduleDefinition::from_parts(None, 1, "0", "1,5", "0", "0").unwrap();
        let expr = translate(&def);
        assert_eq!(expr.to_string(), "0 0 * 1 1,5");
    }

    #[test]
    fn minutes_and_hours_are_verbatim() {
        let def = ScheduleDefinition::from_parts(None, 1, "3", "0,6", "7,19", "15,45").unwrap();
        let expr = translate(&def);
        assert_eq!(expr.minute, "15,45");
        assert_eq!(expr.hour, "7,19");
        assert_eq!(expr.month, "4");
        assert_eq!(expr.day_of_week, "0,6");
        assert_eq!(expr.day_of_month, "*");
    }
}
