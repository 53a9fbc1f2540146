use std::fmt;

use crate::ids::{CircuitSignature, JobId};

/// Status codes reported by the execution service.
///
/// The service emits upper-case names; parsing is case-insensitive and any
/// name outside the documented set is preserved in [`Self::Unrecognized`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub enum JobStatusCode {
    Initializing,
    Queued,
    Running,
    Validating,
    Submitted,
    Failed,
    Error,
    Cancelled,
    Canceled,
    Completed,
    /// Returned by the cancel route when the job has not settled yet.
    CancelRequested,
    Unrecognized(String),
}

/// Partition of [`JobStatusCode`] driving the poll loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    InProgress,
    Failed,
    Completed,
    Unrecognized,
}

impl JobStatusCode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INITIALIZING" => JobStatusCode::Initializing,
            "QUEUED" => JobStatusCode::Queued,
            "RUNNING" => JobStatusCode::Running,
            "VALIDATING" => JobStatusCode::Validating,
            "SUBMITTED" => JobStatusCode::Submitted,
            "FAILED" => JobStatusCode::Failed,
            "ERROR" => JobStatusCode::Error,
            "CANCELLED" => JobStatusCode::Cancelled,
            "CANCELED" => JobStatusCode::Canceled,
            "COMPLETED" => JobStatusCode::Completed,
            "CANCEL_REQUESTED" => JobStatusCode::CancelRequested,
            _ => JobStatusCode::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatusCode::Initializing => "INITIALIZING",
            JobStatusCode::Queued => "QUEUED",
            JobStatusCode::Running => "RUNNING",
            JobStatusCode::Validating => "VALIDATING",
            JobStatusCode::Submitted => "SUBMITTED",
            JobStatusCode::Failed => "FAILED",
            JobStatusCode::Error => "ERROR",
            JobStatusCode::Cancelled => "CANCELLED",
            JobStatusCode::Canceled => "CANCELED",
            JobStatusCode::Completed => "COMPLETED",
            JobStatusCode::CancelRequested => "CANCEL_REQUESTED",
            JobStatusCode::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// `CancelRequested` is deliberately absent from every known set: the
    /// poll route never emits it, so seeing it there is unexpected.
    pub fn classify(&self) -> StatusClass {
        match self {
            JobStatusCode::Initializing
            | JobStatusCode::Queued
            | JobStatusCode::Running
            | JobStatusCode::Validating
            | JobStatusCode::Submitted => StatusClass::InProgress,
            JobStatusCode::Failed
            | JobStatusCode::Error
            | JobStatusCode::Cancelled
            | JobStatusCode::Canceled => StatusClass::Failed,
            JobStatusCode::Completed => StatusClass::Completed,
            JobStatusCode::CancelRequested
            | JobStatusCode::Unrecognized(_) => StatusClass::Unrecognized,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            JobStatusCode::Cancelled
                | JobStatusCode::Canceled
                | JobStatusCode::CancelRequested
        )
    }
}

impl From<String> for JobStatusCode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for JobStatusCode {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<JobStatusCode> for String {
    fn from(value: JobStatusCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-authoritative status record, overwritten by every poll response.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobStatus {
    pub job_id: JobId,
    pub status: JobStatusCode,
    /// Device the job runs on. The service reports `unknown` when it cannot
    /// resolve one; see [`JobStatus::known_backend`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub backend: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_channel_used: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_instance_used: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub detail: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub circuit_signature: Option<CircuitSignature>,
}

impl JobStatus {
    pub fn new(job_id: JobId, status: JobStatusCode) -> Self {
        Self {
            job_id,
            status,
            backend: None,
            runtime_channel_used: None,
            runtime_instance_used: None,
            detail: None,
            circuit_signature: None,
        }
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Backend name unless it is missing, blank or the `unknown` placeholder.
    pub fn known_backend(&self) -> Option<&str> {
        self.backend
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "unknown")
    }
}
