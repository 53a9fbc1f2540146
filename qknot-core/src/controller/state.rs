use std::fmt;

use qknot_model::{
    ExperimentResult, JobId, JobStatus, PendingJobSnapshot, RuntimeSelection,
};
use tokio_util::sync::CancellationToken;

/// Where the controller is in a job's lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControllerPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Resuming,
    Cancelling,
}

impl ControllerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerPhase::Idle => "idle",
            ControllerPhase::Submitting => "submitting",
            ControllerPhase::Polling => "polling",
            ControllerPhase::Resuming => "resuming",
            ControllerPhase::Cancelling => "cancelling",
        }
    }

    pub fn is_busy(&self) -> bool {
        *self != ControllerPhase::Idle
    }
}

impl fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only copy of the controller state for display.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerView {
    pub phase: ControllerPhase,
    /// Job currently in flight, or the pending one when idle.
    pub job_id: Option<JobId>,
    pub last_status: Option<JobStatus>,
    pub last_result: Option<ExperimentResult>,
    pub last_error: Option<String>,
    pub has_pending_job: bool,
}

/// The job owned by the current operation.
#[derive(Debug)]
pub(crate) struct ActiveJob {
    pub generation: u64,
    /// Unknown until the submit response arrives.
    pub job_id: Option<JobId>,
    pub runtime: RuntimeSelection,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
pub(crate) struct ControllerState {
    pub phase: ControllerPhase,
    generation: u64,
    pub active: Option<ActiveJob>,
    pub last_status: Option<JobStatus>,
    pub last_result: Option<ExperimentResult>,
    pub last_error: Option<String>,
    pub pending: Option<PendingJobSnapshot>,
}

impl ControllerState {
    pub fn with_pending(pending: Option<PendingJobSnapshot>) -> Self {
        Self {
            pending,
            ..Self::default()
        }
    }

    /// Start a new operation and hand back its generation and token.
    pub fn begin(
        &mut self,
        phase: ControllerPhase,
        job_id: Option<JobId>,
        runtime: RuntimeSelection,
    ) -> (u64, CancellationToken) {
        self.generation += 1;
        let token = CancellationToken::new();
        self.active = Some(ActiveJob {
            generation: self.generation,
            job_id,
            runtime,
            token: token.clone(),
        });
        self.phase = phase;
        self.last_status = None;
        self.last_error = None;
        (self.generation, token)
    }

    /// Whether `generation` still owns the controller. Late results from a
    /// finished operation must not overwrite newer state.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    pub fn finish(&mut self) {
        self.active = None;
        self.phase = ControllerPhase::Idle;
    }

    pub fn view(&self) -> ControllerView {
        let job_id = self
            .active
            .as_ref()
            .and_then(|active| active.job_id.clone())
            .or_else(|| self.pending.as_ref().map(|p| p.job_id.clone()));
        ControllerView {
            phase: self.phase,
            job_id,
            last_status: self.last_status.clone(),
            last_result: self.last_result.clone(),
            last_error: self.last_error.clone(),
            has_pending_job: self.pending.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_advance_per_operation() {
        let mut state = ControllerState::default();
        let (first, _) = state.begin(
            ControllerPhase::Submitting,
            None,
            RuntimeSelection::default(),
        );
        assert!(state.is_current(first));
        state.finish();
        assert!(!state.is_current(first));
        assert_eq!(state.phase, ControllerPhase::Idle);

        let (second, _) = state.begin(
            ControllerPhase::Resuming,
            Some("job-1".into()),
            RuntimeSelection::default(),
        );
        assert!(second > first);
        assert!(!state.is_current(first));
        assert_eq!(state.view().job_id.as_ref().map(JobId::as_str), Some("job-1"));
    }
}
