//! `cadence-core` — shared configuration and error types.
//!
//! Every other cadence crate builds on the types here: the daemon loads a
//! [`config::CadenceConfig`] once at startup and hands each subsystem the
//! slice of configuration it needs (never a process-wide singleton).

pub mod config;
pub mod error;

pub use config::CadenceConfig;
pub use error::{CoreError, Result};
