//! Core data model definitions shared across qknot crates.
//!
//! Everything here is plain data: the job specification handed to the
//! controller, the status taxonomy reported by the execution service, the
//! persisted pending-job snapshot and the terminal experiment result. Wire
//! (de)serialization is available behind the `serde` feature.
#![allow(missing_docs)]

pub mod api;
pub mod catalog;
pub mod circuit;
pub mod error;
pub mod ids;
pub mod prelude;
pub mod result;
pub mod runtime;
pub mod snapshot;
pub mod spec;
pub mod status;

// Intentionally curated re-exports for downstream consumers.
pub use api::{
    JobLookupRequest, PollResponse, RuntimeServiceRequest, SubmitJobRequest,
    SubmitJobResponse,
};
pub use catalog::{BackendCatalog, BackendInfo};
pub use circuit::CircuitSummary;
pub use error::{ModelError, Result as ModelResult};
pub use ids::{CircuitSignature, JobId};
pub use result::{ExperimentResult, HistogramEntry};
pub use runtime::{RuntimeChannel, RuntimeSelection};
pub use snapshot::PendingJobSnapshot;
pub use spec::{ClosureMethod, JobSpecification, OptimizationLevel};
pub use status::{JobStatus, JobStatusCode, StatusClass};
