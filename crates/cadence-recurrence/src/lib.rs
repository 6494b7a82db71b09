//! `cadence-recurrence` — pure recurrence model, no I/O.
//!
//! A [`ScheduleDefinition`] is the compact stored form of a recurrence rule:
//! sets of 0-based months, days, hours and minutes plus a day-semantics mode.
//! [`translate`] renders it as a five-field cron expression and
//! [`next_occurrence`] computes the next concrete fire instant strictly after
//! a reference time.
//!
//! # Field conventions
//!
//! | Field   | Stored range          | Cron text range        |
//! |---------|-----------------------|------------------------|
//! | minutes | 0–59                  | 0–59 (verbatim)        |
//! | hours   | 0–23                  | 0–23 (verbatim)        |
//! | days    | 0–6 dow / 0–30 dom    | 0–6 dow / 1–31 dom     |
//! | months  | 0–11                  | 1–12                   |

pub mod definition;
pub mod error;
pub mod expression;
pub mod occurrence;

pub use definition::{ScheduleDefinition, ScheduleMode};
pub use error::{RecurrenceError, Result};
pub use expression::{translate, CronExpression};
pub use occurrence::next_occurrence;
