//! Remote operations against the execution service.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use qknot_model::{
    BackendCatalog, JobId, JobSpecification, JobStatus, PollResponse,
    RuntimeSelection, SubmitJobResponse,
};

use crate::error::TransportError;

pub type TransportResult<T> = Result<T, TransportError>;

/// The four operations the controller needs from the service.
#[async_trait]
pub trait JobTransport: Send + Sync {
    async fn submit(
        &self,
        spec: &JobSpecification,
    ) -> TransportResult<SubmitJobResponse>;

    async fn poll(
        &self,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> TransportResult<PollResponse>;

    async fn cancel(
        &self,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> TransportResult<JobStatus>;

    async fn list_capabilities(
        &self,
        runtime: &RuntimeSelection,
    ) -> TransportResult<BackendCatalog>;
}
