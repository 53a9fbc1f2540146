//! Glob-importable set of the types most consumers need.

pub use crate::api::{
    JobLookupRequest, PollResponse, RuntimeServiceRequest, SubmitJobRequest,
    SubmitJobResponse,
};
pub use crate::catalog::{BackendCatalog, BackendInfo};
pub use crate::ids::{CircuitSignature, JobId};
pub use crate::result::{ExperimentResult, HistogramEntry};
pub use crate::runtime::{RuntimeChannel, RuntimeSelection};
pub use crate::snapshot::PendingJobSnapshot;
pub use crate::spec::{
    ClosureMethod, JobSpecification, MAX_SHOTS, OptimizationLevel,
};
pub use crate::status::{JobStatus, JobStatusCode, StatusClass};
