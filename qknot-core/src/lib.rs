//! # qknot Core
//!
//! Client-side machinery for running braid-word knot experiments on a remote
//! hardware-execution service and tracking them to completion.
//!
//! ## Overview
//!
//! - **Validation**: offline checks on the braid word before any network use
//! - **Transport**: the four remote operations (submit, poll, cancel,
//!   list capabilities) with failure classification
//! - **Snapshot store**: one persisted pending-job slot so an interrupted job
//!   can be resumed after a restart
//! - **Poll loop**: bounded, cancellable polling with a fixed delay
//! - **Lifecycle controller**: the state machine tying the above together
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use qknot_core::{
//!     controller::{JobOutcome, LifecycleController},
//!     poll::PollConfig,
//!     snapshot::FileSnapshotStore,
//!     transport::HttpTransport,
//! };
//! use qknot_model::JobSpecification;
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(
//!         "http://127.0.0.1:8000",
//!         std::time::Duration::from_secs(60),
//!     )?;
//!     let store = FileSnapshotStore::new("/tmp/qknot/pending_job.json");
//!     let controller = LifecycleController::new(
//!         Arc::new(transport),
//!         Arc::new(store),
//!         PollConfig::default(),
//!     );
//!
//!     let spec = JobSpecification::new("least_busy", "s1 s2^-1 s1 s2^-1", 1024);
//!     if let JobOutcome::Completed(result) = controller.submit(spec, None).await? {
//!         println!("{}", result.jones_polynomial);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Route constants for the execution service
pub mod api_routes;
/// Lifecycle controller state machine
pub mod controller;
pub mod error;
pub mod poll;
pub mod snapshot;
/// In-process stubs for exercising the controller without a network
pub mod testing;
pub mod transport;
pub mod validation;

pub use controller::{
    ControllerPhase, ControllerView, JobOutcome, LifecycleController,
};
pub use error::{
    ControllerError, PollError, SnapshotError, TransportError, ValidationError,
};
pub use poll::{
    PollConfig, PollLoop, PollOutcome, PollTarget, UnknownStatusPolicy,
};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use transport::{HttpTransport, JobTransport};
pub use validation::{
    BraidAnalysis, BraidToken, MAX_GENERATOR_INDEX, analyze_braid_word,
    validate_braid_word, validate_job_specification,
};
