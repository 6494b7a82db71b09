use thiserror::Error;

/// Errors raised while parsing or validating recurrence rules.
#[derive(Debug, Error)]
pub enum RecurrenceError {
    /// The definition violates a structural rule (empty set, value out of range).
    #[error("Invalid schedule definition: {0}")]
    InvalidDefinition(String),

    /// A comma-joined integer list could not be parsed.
    #[error("Invalid field list '{list}': {reason}")]
    InvalidList { list: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
