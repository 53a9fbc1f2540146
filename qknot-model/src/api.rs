//! Request and response bodies exchanged with the execution service.

use crate::circuit::CircuitSummary;
use crate::ids::{CircuitSignature, JobId};
use crate::result::ExperimentResult;
use crate::runtime::RuntimeSelection;
use crate::spec::{ClosureMethod, JobSpecification, OptimizationLevel};
use crate::status::{JobStatus, JobStatusCode};

/// Body of the submit route.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmitJobRequest {
    pub backend_name: String,
    pub braid_word: String,
    pub shots: u32,
    pub optimization_level: OptimizationLevel,
    pub closure_method: ClosureMethod,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runtime_channel: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runtime_instance: Option<String>,
}

impl From<&JobSpecification> for SubmitJobRequest {
    fn from(spec: &JobSpecification) -> Self {
        Self {
            backend_name: spec.backend_name.clone(),
            braid_word: spec.braid_word.clone(),
            shots: spec.shots,
            optimization_level: spec.optimization_level,
            closure_method: spec.closure_method,
            runtime_channel: spec.runtime.channel_wire(),
            runtime_instance: spec.runtime.instance_wire(),
        }
    }
}

/// Body shared by the poll and cancel routes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobLookupRequest {
    pub job_id: JobId,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runtime_channel: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runtime_instance: Option<String>,
}

impl JobLookupRequest {
    pub fn new(job_id: &JobId, runtime: &RuntimeSelection) -> Self {
        Self {
            job_id: job_id.clone(),
            runtime_channel: runtime.channel_wire(),
            runtime_instance: runtime.instance_wire(),
        }
    }
}

/// Body of the list-capabilities route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeServiceRequest {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runtime_channel: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub runtime_instance: Option<String>,
}

impl From<&RuntimeSelection> for RuntimeServiceRequest {
    fn from(runtime: &RuntimeSelection) -> Self {
        Self {
            runtime_channel: runtime.channel_wire(),
            runtime_instance: runtime.instance_wire(),
        }
    }
}

#[cfg(feature = "serde")]
fn submitted_status() -> JobStatusCode {
    JobStatusCode::Submitted
}

/// Response of the submit route.
///
/// `job_id` stays optional on decode so a malformed response reaches the
/// controller, which owns the missing-identifier error.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmitJobResponse {
    #[cfg_attr(feature = "serde", serde(default))]
    pub job_id: Option<JobId>,
    #[cfg_attr(feature = "serde", serde(default = "submitted_status"))]
    pub status: JobStatusCode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub backend: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_channel_used: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_instance_used: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub closure_method: Option<ClosureMethod>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub circuit_summary: Option<CircuitSummary>,
}

impl SubmitJobResponse {
    pub fn accepted(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            status: JobStatusCode::Submitted,
            backend: None,
            runtime_channel_used: None,
            runtime_instance_used: None,
            closure_method: None,
            circuit_summary: None,
        }
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_signature(mut self, signature: CircuitSignature) -> Self {
        let summary = self.circuit_summary.get_or_insert_with(Default::default);
        summary.signature = Some(signature);
        self
    }

    /// Signature of the circuit the service actually built, if it sent one.
    pub fn echoed_signature(&self) -> Option<&CircuitSignature> {
        self.circuit_summary
            .as_ref()
            .and_then(|summary| summary.signature.as_ref())
    }

    /// Non-empty job identifier, if the service assigned one.
    pub fn assigned_job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref().filter(|id| !id.is_empty())
    }

    /// Initial status record for a job whose identifier is known.
    pub fn to_status(&self, job_id: JobId) -> JobStatus {
        JobStatus {
            job_id,
            status: self.status.clone(),
            backend: self.backend.clone(),
            runtime_channel_used: self.runtime_channel_used.clone(),
            runtime_instance_used: self.runtime_instance_used.clone(),
            detail: None,
            circuit_signature: self.echoed_signature().cloned(),
        }
    }
}

/// Decoded poll response: either a status update or the terminal result.
#[derive(Clone, Debug, PartialEq)]
pub enum PollResponse {
    Status(JobStatus),
    Completed(ExperimentResult),
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::runtime::RuntimeChannel;

    #[test]
    fn submit_request_omits_auto_channel() {
        let spec = JobSpecification::new("ibm_kyiv", "s1 s2 s1", 1024);
        let body = serde_json::to_value(SubmitJobRequest::from(&spec))
            .expect("encode");
        assert_eq!(body["backend_name"], "ibm_kyiv");
        assert_eq!(body["optimization_level"], 3);
        assert_eq!(body["closure_method"], "trace");
        assert!(body.get("runtime_channel").is_none());
        assert!(body.get("runtime_instance").is_none());
    }

    #[test]
    fn lookup_request_carries_named_channel() {
        let runtime = RuntimeSelection::new(
            RuntimeChannel::parse("ibm_cloud"),
            Some("crn:v1:instance".into()),
        );
        let body =
            serde_json::to_value(JobLookupRequest::new(&"job-1".into(), &runtime))
                .expect("encode");
        assert_eq!(body["job_id"], "job-1");
        assert_eq!(body["runtime_channel"], "ibm_cloud");
        assert_eq!(body["runtime_instance"], "crn:v1:instance");
    }

    #[test]
    fn submit_response_exposes_echoed_signature() {
        let response: SubmitJobResponse = serde_json::from_str(
            r#"{
                "job_id": "job-123",
                "status": "QUEUED",
                "backend": "ibm_kyiv",
                "runtime_channel_used": "ibm_cloud",
                "circuit_summary": {"depth": 12, "signature": "abc123"}
            }"#,
        )
        .expect("decode");
        assert_eq!(response.echoed_signature().map(|s| s.as_str()), Some("abc123"));
        let status = response.to_status("job-123".into());
        assert_eq!(status.status, JobStatusCode::Queued);
        assert_eq!(status.known_backend(), Some("ibm_kyiv"));
    }

    #[test]
    fn blank_job_id_is_not_assigned() {
        let response: SubmitJobResponse =
            serde_json::from_str(r#"{"job_id": "  "}"#).expect("decode");
        assert_eq!(response.assigned_job_id(), None);
        assert_eq!(response.status, JobStatusCode::Submitted);
    }
}
