//! Deterministic stand-ins for the remote service.
//!
//! Used by this crate's own tests and by downstream crates that want to drive
//! a [`LifecycleController`](crate::controller::LifecycleController) without a
//! network.

mod transport;

pub use transport::{ScriptedTransport, TransportCall};

use qknot_model::{ExperimentResult, HistogramEntry, JobStatusCode};

/// Two-outcome result payload with a fixed Jones polynomial.
pub fn sample_result(job_id: &str) -> ExperimentResult {
    ExperimentResult {
        job_id: job_id.into(),
        backend: "ibm_kyiv".into(),
        runtime_channel_used: Some("ibm_quantum_platform".into()),
        runtime_instance_used: None,
        histogram: vec![
            HistogramEntry {
                name: "0".into(),
                probability: 0.62,
            },
            HistogramEntry {
                name: "1".into(),
                probability: 0.38,
            },
        ],
        expectation_value: 0.24,
        jones_polynomial: "V(t) = t + t^3 - t^4".into(),
        status: JobStatusCode::Completed,
    }
}
