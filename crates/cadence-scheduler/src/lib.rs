//! `cadence-scheduler` — declarative recurrence firing.
//!
//! Schedule definitions live in a SQLite `schedules` table, managed through
//! [`ScheduleStore`] (validated registration) and evaluated by
//! [`SchedulerEngine`]: a tokio tick loop that computes each enabled
//! definition's next occurrence and submits the associated job through the
//! producer. The `last_fired_at` watermark doubles as the idempotent-fire
//! guard, so an occurrence fires at most once even across overlapping ticks
//! or competing engine instances.

pub mod db;
pub mod definitions;
pub mod engine;
pub mod error;

pub use definitions::{ScheduleRecord, ScheduleStore};
pub use engine::SchedulerEngine;
pub use error::{Result, SchedulerError};
