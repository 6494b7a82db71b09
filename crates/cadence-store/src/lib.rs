//! `cadence-store` — durable job queue on SQLite.
//!
//! # Overview
//!
//! Jobs live in a single `jobs` table. Mutual exclusion between competing
//! workers is achieved entirely through guarded conditional UPDATEs: the
//! WHERE clause of every state transition re-checks the eligibility
//! predicate, so under concurrent callers exactly one wins per job
//! (compare-and-swap). No in-process locking is shared between components —
//! each opens its own connection.
//!
//! # Job lifecycle
//!
//! | Transition              | Operation                                  |
//! |-------------------------|--------------------------------------------|
//! | → `available`           | [`JobStore::enqueue`] / [`Producer`]       |
//! | `available` → `leased`  | [`JobStore::try_lease`] (attempts += 1)    |
//! | expired `leased` → `leased` | `try_lease` by any worker, attempts += 1 |
//! | `leased` → `completed`  | [`JobStore::ack_complete`] (owner only)    |
//! | `leased` → `available`  | [`JobStore::ack_fail`], attempts remaining |
//! | `leased` → `failed`     | `ack_fail` or `try_lease` at the ceiling   |

pub mod db;
pub mod error;
pub mod producer;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use producer::Producer;
pub use store::{JobStore, StatusCounts};
pub use types::{Job, JobStatus};
