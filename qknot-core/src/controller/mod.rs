mod state;

pub use state::{ControllerPhase, ControllerView};

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use qknot_model::{
    BackendCatalog, CircuitSignature, ExperimentResult, JobId, JobSpecification,
    JobStatus, JobStatusCode, PendingJobSnapshot, RuntimeSelection,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::state::ControllerState;
use crate::error::{ControllerError, PollError, Result};
use crate::poll::{PollConfig, PollLoop, PollOutcome, PollTarget};
use crate::snapshot::SnapshotStore;
use crate::transport::JobTransport;
use crate::validation::validate_job_specification;

/// Invoked once per successfully completed job.
pub type CompletionCallback = Arc<dyn Fn(&ExperimentResult) + Send + Sync>;

/// How a submit or resume ended when it did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum JobOutcome {
    Completed(ExperimentResult),
    /// Stopped by [`LifecycleController::cancel`]. Not an error.
    Cancelled,
}

/// Execution job lifecycle controller.
///
/// Owns at most one job at a time. The handle is cheap to clone; clones share
/// state, so one task can run [`submit`](Self::submit) while another calls
/// [`cancel`](Self::cancel).
///
/// ```text
/// idle ──submit──▶ submitting ──job id──▶ polling ──terminal/timeout──▶ idle
/// idle ──resume──▶ resuming ──terminal/timeout──▶ idle
/// submitting|polling|resuming ──cancel──▶ cancelling ──▶ idle
/// ```
#[derive(Clone)]
pub struct LifecycleController {
    transport: Arc<dyn JobTransport>,
    store: Arc<dyn SnapshotStore>,
    poll_loop: PollLoop,
    on_complete: Option<CompletionCallback>,
    state: Arc<Mutex<ControllerState>>,
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = self
            .state
            .try_lock()
            .map(|state| state.phase.as_str())
            .unwrap_or("locked");
        f.debug_struct("LifecycleController")
            .field("phase", &phase)
            .field("poll", self.poll_loop.config())
            .field("has_completion_callback", &self.on_complete.is_some())
            .finish()
    }
}

impl LifecycleController {
    /// Build a controller over `store`, reading it once. A stored snapshot
    /// shows up as [`has_pending_job`](Self::has_pending_job); nothing is
    /// resumed automatically.
    pub fn new(
        transport: Arc<dyn JobTransport>,
        store: Arc<dyn SnapshotStore>,
        config: PollConfig,
    ) -> Self {
        let pending = match store.load() {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "failed to read pending job snapshot; starting empty");
                None
            }
        };
        if let Some(snapshot) = &pending {
            info!(job_id = %snapshot.job_id, "found pending job from a previous session");
        }

        Self {
            poll_loop: PollLoop::new(
                Arc::clone(&transport),
                Arc::clone(&store),
                config,
            ),
            transport,
            store,
            on_complete: None,
            state: Arc::new(Mutex::new(ControllerState::with_pending(pending))),
        }
    }

    pub fn with_completion_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ExperimentResult) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    pub fn view(&self) -> ControllerView {
        self.state.lock().view()
    }

    pub fn phase(&self) -> ControllerPhase {
        self.state.lock().phase
    }

    pub fn has_pending_job(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn pending_snapshot(&self) -> Option<PendingJobSnapshot> {
        self.state.lock().pending.clone()
    }

    pub fn last_status(&self) -> Option<JobStatus> {
        self.state.lock().last_status.clone()
    }

    pub fn last_result(&self) -> Option<ExperimentResult> {
        self.state.lock().last_result.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Validate, submit and poll `spec` to a terminal state.
    ///
    /// When `artifact_signature` is given and the service echoes a different
    /// signature for the circuit it built, the job is abandoned before the
    /// first poll.
    pub async fn submit(
        &self,
        spec: JobSpecification,
        artifact_signature: Option<&CircuitSignature>,
    ) -> Result<JobOutcome> {
        let (generation, token) = {
            let mut state = self.state.lock();
            if state.phase.is_busy() {
                return Err(ControllerError::Busy { phase: state.phase });
            }
            if let Err(err) = validate_job_specification(&spec) {
                state.last_error = Some(err.to_string());
                return Err(err.into());
            }
            state.begin(ControllerPhase::Submitting, None, spec.runtime.clone())
        };

        info!(
            backend = %spec.backend_name,
            shots = spec.shots,
            runtime_channel = %spec.runtime.channel,
            "submitting job"
        );

        let response = match self.transport.submit(&spec).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(generation, err.into())),
        };

        if let (Some(generated), Some(submitted)) =
            (artifact_signature, response.echoed_signature())
            && generated != submitted
        {
            return Err(self.fail(
                generation,
                ControllerError::SignatureMismatch {
                    generated: generated.clone(),
                    submitted: submitted.clone(),
                },
            ));
        }

        let Some(job_id) = response.assigned_job_id().cloned() else {
            return Err(self.fail(generation, ControllerError::MissingJobId));
        };

        let status = response.to_status(job_id.clone());
        let snapshot = PendingJobSnapshot::new(
            job_id.clone(),
            status.known_backend().map(str::to_string),
            &spec.runtime,
        );
        // Only a persisted snapshot makes the job resumable after a restart.
        let persisted = match self.store.save(&snapshot) {
            Ok(()) => true,
            Err(err) => {
                warn!(%job_id, error = %err, "failed to persist pending job snapshot");
                false
            }
        };
        info!(%job_id, status = %status.status, "job accepted");

        let cancel_requested = {
            let mut state = self.state.lock();
            if !state.is_current(generation) {
                return Ok(JobOutcome::Cancelled);
            }
            state.pending = persisted.then(|| snapshot.clone());
            state.last_status = Some(status);
            state.phase = ControllerPhase::Polling;
            if let Some(active) = state.active.as_mut() {
                active.job_id = Some(job_id.clone());
            }
            let requested = token.is_cancelled();
            if requested {
                state.phase = ControllerPhase::Cancelling;
            }
            requested
        };

        if cancel_requested {
            info!(%job_id, "cancel was requested during submission; cancelling remotely");
            self.remote_cancel(generation, &job_id, &spec.runtime).await?;
            return Ok(JobOutcome::Cancelled);
        }

        let target = PollTarget {
            job_id,
            backend: snapshot.backend,
            runtime: spec.runtime,
        };
        self.drive(generation, &target, &token).await
    }

    /// Re-enter polling for the stored pending job without resubmitting.
    /// Runtime inputs come from the snapshot.
    pub async fn resume(&self) -> Result<JobOutcome> {
        let (generation, token, target) = {
            let mut state = self.state.lock();
            if state.phase.is_busy() {
                return Err(ControllerError::Busy { phase: state.phase });
            }
            let Some(snapshot) = state.pending.clone() else {
                return Err(ControllerError::NoPendingJob);
            };
            let target = PollTarget::from_snapshot(&snapshot);
            let (generation, token) = state.begin(
                ControllerPhase::Resuming,
                Some(target.job_id.clone()),
                target.runtime.clone(),
            );
            (generation, token, target)
        };

        info!(job_id = %target.job_id, "resuming pending job");
        self.drive(generation, &target, &token).await
    }

    /// Stop the in-flight job.
    ///
    /// The poll loop is told to stop and the service is asked to cancel the
    /// job without waiting for the loop to notice. Returns the status the
    /// service reported, or `None` when the job id is not known yet; the
    /// remote cancel is then issued by [`submit`](Self::submit) as soon as
    /// the id arrives.
    pub async fn cancel(&self) -> Result<Option<JobStatus>> {
        let (generation, job_id, runtime) = {
            let mut state = self.state.lock();
            if state.phase == ControllerPhase::Cancelling {
                debug!("cancel already in progress");
                return Ok(None);
            }
            let Some(active) = state.active.as_ref() else {
                return Err(ControllerError::NotInFlight);
            };
            active.token.cancel();
            let Some(job_id) = active.job_id.clone() else {
                info!("cancel requested before the job id is known; deferring remote cancel");
                return Ok(None);
            };
            let claimed = (active.generation, job_id, active.runtime.clone());
            state.phase = ControllerPhase::Cancelling;
            claimed
        };

        info!(%job_id, "cancelling job");
        self.remote_cancel(generation, &job_id, &runtime)
            .await
            .map(Some)
    }

    /// Forget the pending job without resuming it. Only allowed while idle.
    pub fn discard_pending(&self) -> Result<Option<PendingJobSnapshot>> {
        let mut state = self.state.lock();
        if state.phase.is_busy() {
            return Err(ControllerError::Busy { phase: state.phase });
        }
        if let Err(err) = self.store.clear() {
            let err = ControllerError::from(err);
            state.last_error = Some(err.to_string());
            return Err(err);
        }
        let discarded = state.pending.take();
        if let Some(snapshot) = &discarded {
            info!(job_id = %snapshot.job_id, "discarded pending job");
        }
        Ok(discarded)
    }

    /// Devices available on the given runtime. Allowed at any phase.
    pub async fn list_capabilities(
        &self,
        runtime: &RuntimeSelection,
    ) -> Result<BackendCatalog> {
        self.transport.list_capabilities(runtime).await.map_err(|err| {
            let err = ControllerError::from(err);
            let mut state = self.state.lock();
            if !state.phase.is_busy() {
                state.last_error = Some(err.to_string());
            }
            err
        })
    }

    async fn drive(
        &self,
        generation: u64,
        target: &PollTarget,
        token: &CancellationToken,
    ) -> Result<JobOutcome> {
        let shared = Arc::clone(&self.state);
        let outcome = self
            .poll_loop
            .run(target, token, move |status| {
                let mut state = shared.lock();
                if state.is_current(generation)
                    && state.phase != ControllerPhase::Cancelling
                {
                    state.last_status = Some(status.clone());
                }
            })
            .await;

        match outcome {
            Ok(PollOutcome::Completed(result)) => {
                if let Err(err) = self.store.clear() {
                    warn!(job_id = %target.job_id, error = %err, "failed to clear pending job snapshot");
                }
                let owns_state = {
                    let mut state = self.state.lock();
                    let current = state.is_current(generation);
                    if current {
                        state.pending = None;
                        state.last_status = Some(completed_status(&result));
                        state.last_result = Some(result.clone());
                        if state.phase != ControllerPhase::Cancelling {
                            state.finish();
                        }
                    }
                    current
                };
                if owns_state && let Some(callback) = &self.on_complete {
                    callback(&result);
                }
                Ok(JobOutcome::Completed(result))
            }
            Ok(PollOutcome::CancelledLocally) => {
                let mut state = self.state.lock();
                if state.is_current(generation)
                    && state.phase != ControllerPhase::Cancelling
                {
                    state.finish();
                }
                Ok(JobOutcome::Cancelled)
            }
            Err(err) => {
                {
                    let mut state = self.state.lock();
                    if state.is_current(generation) {
                        match &err {
                            PollError::TimedOut { snapshot, .. } => {
                                state.pending = snapshot.clone();
                            }
                            // Job may still be running or hold a result;
                            // keep it resumable.
                            PollError::Transport(_) => {}
                            PollError::UnexpectedStatus { status, .. }
                                if *status == JobStatusCode::Completed => {}
                            PollError::JobFailed { .. }
                            | PollError::UnexpectedStatus { .. } => {
                                state.pending = None;
                            }
                        }
                        state.last_error = Some(err.to_string());
                        if state.phase != ControllerPhase::Cancelling {
                            state.finish();
                        }
                    }
                }
                warn!(job_id = %target.job_id, error = %err, "job did not complete");
                Err(err.into())
            }
        }
    }

    async fn remote_cancel(
        &self,
        generation: u64,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> Result<JobStatus> {
        match self.transport.cancel(job_id, runtime).await {
            Ok(status) => {
                if let Err(err) = self.store.clear() {
                    warn!(%job_id, error = %err, "failed to clear pending job snapshot");
                }
                let mut state = self.state.lock();
                if state.is_current(generation) {
                    state.pending = None;
                    state.last_status = Some(status.clone());
                    state.finish();
                }
                info!(%job_id, status = %status.status, "job cancelled");
                Ok(status)
            }
            Err(err) => {
                let err = ControllerError::from(err);
                let mut state = self.state.lock();
                if state.is_current(generation) {
                    state.last_error = Some(err.to_string());
                    state.finish();
                }
                warn!(%job_id, error = %err, "remote cancel failed; job stays resumable");
                Err(err)
            }
        }
    }

    /// Record `err` as the outcome of operation `generation` and return to idle.
    fn fail(&self, generation: u64, err: ControllerError) -> ControllerError {
        let mut state = self.state.lock();
        if state.is_current(generation) {
            state.last_error = Some(err.to_string());
            state.finish();
        }
        warn!(error = %err, "job operation failed");
        err
    }
}

fn completed_status(result: &ExperimentResult) -> JobStatus {
    JobStatus {
        job_id: result.job_id.clone(),
        status: JobStatusCode::Completed,
        backend: Some(result.backend.clone()),
        runtime_channel_used: result.runtime_channel_used.clone(),
        runtime_instance_used: result.runtime_instance_used.clone(),
        detail: None,
        circuit_signature: None,
    }
}
