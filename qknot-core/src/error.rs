use qknot_model::{
    CircuitSignature, JobId, JobStatusCode, PendingJobSnapshot, spec::MAX_SHOTS,
};
use thiserror::Error;

use crate::controller::ControllerPhase;

/// Local validation failure. Never reaches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("braid word cannot be empty")]
    Empty,

    #[error(
        "unsupported braid token '{token}'; tokens follow sN or sN^-1 where N is a positive integer"
    )]
    UnsupportedToken { token: String },

    #[error("braid token '{token}' exceeds the largest supported generator s{max}")]
    GeneratorOutOfRange { token: String, max: u32 },

    #[error("braid word must contain at least three generators, got {count}")]
    TooFewTokens { count: usize },

    #[error("braid word must include at least two distinct generators")]
    TooFewGenerators,

    #[error(
        "braid word must use contiguous generators from s1 through s{max}; missing: {}",
        generator_list(.missing)
    )]
    NonContiguous { max: u32, missing: Vec<u32> },

    #[error("backend name cannot be empty")]
    EmptyBackend,

    #[error("shots must be between 1 and {max}, got {shots}", max = MAX_SHOTS)]
    ShotsOutOfRange { shots: u32 },
}

/// `[2, 4]` renders as `s2, s4`.
pub(crate) fn generator_list(indices: &[u32]) -> String {
    indices
        .iter()
        .map(|index| format!("s{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request validation failed: {detail}")]
    RequestValidation { detail: String },

    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("could not reach the backend")]
    Unreachable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("could not decode {context} response: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },

    #[error("invalid transport configuration: {0}")]
    Configuration(String),
}

impl TransportError {
    pub fn unreachable(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TransportError::Unreachable(source.into())
    }
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to persist snapshot: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("{message}")]
    JobFailed {
        job_id: JobId,
        status: JobStatusCode,
        message: String,
    },

    #[error("unexpected status '{status}' for job {job_id}")]
    UnexpectedStatus { job_id: JobId, status: JobStatusCode },

    /// Distinct from failure: the job may still finish. `snapshot` is `None`
    /// when it could not be persisted.
    #[error("job {job_id} did not finish within {attempts} polls")]
    TimedOut {
        job_id: JobId,
        attempts: u32,
        snapshot: Option<PendingJobSnapshot>,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("a job is already in flight (controller is {phase})")]
    Busy { phase: ControllerPhase },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(
        "generated circuit signature {generated} does not match submitted signature {submitted}"
    )]
    SignatureMismatch {
        generated: CircuitSignature,
        submitted: CircuitSignature,
    },

    #[error("backend accepted the job but returned no job id")]
    MissingJobId,

    #[error("no pending job to resume")]
    NoPendingJob,

    #[error("no job is in flight")]
    NotInFlight,
}

impl ControllerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ControllerError::Poll(PollError::TimedOut { .. }))
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_contiguous_message_lists_every_missing_generator() {
        let err = ValidationError::NonContiguous {
            max: 5,
            missing: vec![2, 4],
        };
        assert_eq!(
            err.to_string(),
            "braid word must use contiguous generators from s1 through s5; missing: s2, s4"
        );
    }

    #[test]
    fn transport_messages_carry_server_detail() {
        let err = TransportError::Server {
            status: 500,
            detail: "boom".into(),
        };
        assert_eq!(err.to_string(), "server error (500): boom");
        let err = TransportError::RequestValidation {
            detail: "braid_word: field required".into(),
        };
        assert_eq!(
            err.to_string(),
            "request validation failed: braid_word: field required"
        );
    }

    #[test]
    fn shots_message_names_the_limit() {
        let err = ValidationError::ShotsOutOfRange { shots: 0 };
        assert_eq!(
            err.to_string(),
            "shots must be between 1 and 100000, got 0"
        );
    }
}
