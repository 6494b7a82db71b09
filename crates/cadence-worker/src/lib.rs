//! `cadence-worker` — the consumer side of the queue.
//!
//! A [`Worker`] competes with its peers for leases, dispatches each claimed
//! job through a [`HandlerRegistry`], and acknowledges the outcome. Handlers
//! report failures through a discriminated [`ExecutionError`] so retry policy
//! applies only to business-logic failures, never to system faults.
//!
//! Duplicate execution is possible by design (at-least-once delivery):
//! a handler that outlives its lease may run concurrently with a second
//! claim, so handler side effects must tolerate re-execution.

pub mod error;
pub mod handler;
pub mod identity;
pub mod registry;
pub mod worker;

pub use error::{Result, WorkerError};
pub use handler::{ExecutionError, JobHandler};
pub use identity::ConsumerIdentity;
pub use registry::HandlerRegistry;
pub use worker::Worker;
