use serde::{Deserialize, Serialize};

/// Lifecycle state of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Eligible for leasing.
    Available,
    /// Claimed by a worker; the claim lapses at `lock_expires_at`.
    Leased,
    /// Acknowledged successful.
    Completed,
    /// Attempts exhausted (or failed at the ceiling); terminal.
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Available => "available",
            JobStatus::Leased => "leased",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "available" => Ok(JobStatus::Available),
            "leased" => Ok(JobStatus::Leased),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A persisted unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// UUIDv7 string — primary key, time-sortable.
    pub id: String,
    /// Tag identifying the handler responsible for this job.
    pub name: String,
    /// Opaque JSON payload forwarded to the handler unchanged.
    pub payload: serde_json::Value,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Lease acquisitions so far. Monotone; incremented once per lease.
    pub attempts: u32,
    /// Ceiling on lease acquisitions before the job is failed permanently.
    pub max_attempts: u32,
    /// Identity of the worker holding the current lease, if any.
    pub lock_holder: Option<String>,
    /// RFC3339 instant after which the lease counts as abandoned.
    pub lock_expires_at: Option<String>,
    /// Most recently recorded executor error, if any.
    pub last_error: Option<String>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// RFC3339 timestamp of the last state change.
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_display_from_str_round_trip() {
        for status in [
            JobStatus::Available,
            JobStatus::Leased,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(JobStatus::from_str("pending").is_err());
    }
}
