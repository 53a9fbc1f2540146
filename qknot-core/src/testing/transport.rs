use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use qknot_model::{
    BackendCatalog, ExperimentResult, JobId, JobSpecification, JobStatus,
    JobStatusCode, PollResponse, RuntimeSelection, SubmitJobResponse,
};

use crate::error::TransportError;
use crate::transport::{JobTransport, TransportResult};

/// One recorded call against a [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    Submit { backend_name: String, braid_word: String },
    Poll { job_id: JobId, runtime: RuntimeSelection },
    Cancel { job_id: JobId, runtime: RuntimeSelection },
    ListCapabilities { runtime: RuntimeSelection },
}

#[derive(Debug, Default)]
struct Script {
    submits: VecDeque<TransportResult<SubmitJobResponse>>,
    polls: VecDeque<TransportResult<PollResponse>>,
    poll_fallback: Option<JobStatus>,
    cancels: VecDeque<TransportResult<JobStatus>>,
    catalog: Option<BackendCatalog>,
    submit_delay: Option<Duration>,
    calls: Vec<TransportCall>,
}

/// Replays queued responses in order and records every call.
///
/// Exhausted queues fall back to: an error for submit, the repeating poll
/// status (if set) or an error for poll, a `CANCELLED` status for cancel and
/// an empty catalog for list-capabilities.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit(&self, response: SubmitJobResponse) {
        self.script.lock().submits.push_back(Ok(response));
    }

    pub fn push_submit_error(&self, error: TransportError) {
        self.script.lock().submits.push_back(Err(error));
    }

    /// Hold every submit call open for `delay` before answering.
    pub fn delay_submit(&self, delay: Duration) {
        self.script.lock().submit_delay = Some(delay);
    }

    pub fn push_poll_status(&self, status: JobStatus) {
        self.script
            .lock()
            .polls
            .push_back(Ok(PollResponse::Status(status)));
    }

    pub fn push_poll_result(&self, result: ExperimentResult) {
        self.script
            .lock()
            .polls
            .push_back(Ok(PollResponse::Completed(result)));
    }

    pub fn push_poll_error(&self, error: TransportError) {
        self.script.lock().polls.push_back(Err(error));
    }

    /// Answer every poll past the queued ones with `status`.
    pub fn repeat_poll_status(&self, status: JobStatus) {
        self.script.lock().poll_fallback = Some(status);
    }

    pub fn push_cancel(&self, status: JobStatus) {
        self.script.lock().cancels.push_back(Ok(status));
    }

    pub fn push_cancel_error(&self, error: TransportError) {
        self.script.lock().cancels.push_back(Err(error));
    }

    pub fn set_catalog(&self, catalog: BackendCatalog) {
        self.script.lock().catalog = Some(catalog);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.script.lock().calls.clone()
    }

    pub fn submit_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Submit { .. }))
    }

    pub fn poll_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Poll { .. }))
    }

    pub fn cancel_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Cancel { .. }))
    }

    fn count(&self, predicate: impl Fn(&TransportCall) -> bool) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

fn unscripted(operation: &str) -> TransportError {
    TransportError::Server {
        status: 599,
        detail: format!("no scripted {operation} response"),
    }
}

#[async_trait]
impl JobTransport for ScriptedTransport {
    async fn submit(
        &self,
        spec: &JobSpecification,
    ) -> TransportResult<SubmitJobResponse> {
        let delay = {
            let mut script = self.script.lock();
            script.calls.push(TransportCall::Submit {
                backend_name: spec.backend_name.clone(),
                braid_word: spec.braid_word.clone(),
            });
            script.submit_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .submits
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("submit")))
    }

    async fn poll(
        &self,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> TransportResult<PollResponse> {
        let mut script = self.script.lock();
        script.calls.push(TransportCall::Poll {
            job_id: job_id.clone(),
            runtime: runtime.clone(),
        });
        if let Some(next) = script.polls.pop_front() {
            return next;
        }
        match &script.poll_fallback {
            Some(status) => Ok(PollResponse::Status(status.clone())),
            None => Err(unscripted("poll")),
        }
    }

    async fn cancel(
        &self,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> TransportResult<JobStatus> {
        let mut script = self.script.lock();
        script.calls.push(TransportCall::Cancel {
            job_id: job_id.clone(),
            runtime: runtime.clone(),
        });
        script.cancels.pop_front().unwrap_or_else(|| {
            Ok(JobStatus::new(job_id.clone(), JobStatusCode::Cancelled))
        })
    }

    async fn list_capabilities(
        &self,
        runtime: &RuntimeSelection,
    ) -> TransportResult<BackendCatalog> {
        let mut script = self.script.lock();
        script.calls.push(TransportCall::ListCapabilities {
            runtime: runtime.clone(),
        });
        Ok(script.catalog.clone().unwrap_or_default())
    }
}
