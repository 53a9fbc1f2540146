//! Bounded, cancellable status polling for a single job.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use qknot_model::{
    ExperimentResult, JobId, JobStatus, PendingJobSnapshot, PollResponse,
    RuntimeSelection, StatusClass,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::PollError;
use crate::snapshot::SnapshotStore;
use crate::transport::JobTransport;

/// What to do with a status string outside the documented taxonomy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStatusPolicy {
    /// Stop polling and surface the status as an error.
    #[default]
    Fail,
    /// Treat it like an in-progress status.
    KeepPolling,
}

impl UnknownStatusPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownStatusPolicy::Fail => "fail",
            UnknownStatusPolicy::KeepPolling => "keep-polling",
        }
    }
}

impl FromStr for UnknownStatusPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail" => Ok(UnknownStatusPolicy::Fail),
            "keep-polling" => Ok(UnknownStatusPolicy::KeepPolling),
            other => Err(format!(
                "unknown status policy '{other}'; expected 'fail' or 'keep-polling'"
            )),
        }
    }
}

impl fmt::Display for UnknownStatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poll cadence. Defaults give a ten minute budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Poll requests issued before the job is declared timed out.
    pub max_attempts: u32,
    /// Delay between consecutive polls (ms).
    pub interval_ms: u64,
    pub unknown_status: UnknownStatusPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            interval_ms: 5_000,
            unknown_status: UnknownStatusPolicy::Fail,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// The job being polled plus the runtime inputs to poll it with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollTarget {
    pub job_id: JobId,
    /// Latest device name known for the job; carried into the timeout snapshot.
    pub backend: Option<String>,
    pub runtime: RuntimeSelection,
}

impl PollTarget {
    pub fn from_snapshot(snapshot: &PendingJobSnapshot) -> Self {
        Self {
            job_id: snapshot.job_id.clone(),
            backend: snapshot.backend.clone(),
            runtime: snapshot.runtime(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Completed(ExperimentResult),
    /// The cancellation token was raised; nothing was written.
    CancelledLocally,
}

#[derive(Clone)]
pub struct PollLoop {
    transport: Arc<dyn JobTransport>,
    store: Arc<dyn SnapshotStore>,
    config: PollConfig,
}

impl fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollLoop")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PollLoop {
    pub fn new(
        transport: Arc<dyn JobTransport>,
        store: Arc<dyn SnapshotStore>,
        config: PollConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `target` until it reaches a terminal status, the attempt budget
    /// runs out, or `cancel` is raised.
    ///
    /// `on_status` sees every non-terminal status record as it arrives, and
    /// the failed one before the error is returned. Polls are strictly
    /// sequential; the only suspension points are the request itself and the
    /// delay between attempts.
    pub async fn run<F>(
        &self,
        target: &PollTarget,
        cancel: &CancellationToken,
        mut on_status: F,
    ) -> Result<PollOutcome, PollError>
    where
        F: FnMut(&JobStatus) + Send,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let interval = self.config.interval();
        let job_id = &target.job_id;
        let mut latest_backend = target.backend.clone();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                info!(%job_id, attempt, "polling stopped by cancellation");
                return Ok(PollOutcome::CancelledLocally);
            }

            let response = self.transport.poll(job_id, &target.runtime).await?;

            if cancel.is_cancelled() {
                info!(%job_id, attempt, "polling stopped by cancellation");
                return Ok(PollOutcome::CancelledLocally);
            }

            let status = match response {
                PollResponse::Completed(result) => {
                    info!(%job_id, attempt, backend = %result.backend, "job completed");
                    return Ok(PollOutcome::Completed(result));
                }
                PollResponse::Status(status) => status,
            };

            if let Some(backend) = status.known_backend() {
                latest_backend = Some(backend.to_string());
            }

            match status.status.classify() {
                StatusClass::InProgress => {
                    debug!(%job_id, attempt, status = %status.status, "job still in progress");
                    on_status(&status);
                }
                StatusClass::Failed => {
                    on_status(&status);
                    self.clear_snapshot(job_id);
                    let message = status
                        .detail
                        .as_deref()
                        .map(str::trim)
                        .filter(|detail| !detail.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            format!("job failed with status {}", status.status)
                        });
                    warn!(%job_id, attempt, status = %status.status, %message, "job failed");
                    return Err(PollError::JobFailed {
                        job_id: job_id.clone(),
                        status: status.status,
                        message,
                    });
                }
                StatusClass::Unrecognized => match self.config.unknown_status {
                    UnknownStatusPolicy::Fail => {
                        on_status(&status);
                        self.clear_snapshot(job_id);
                        warn!(%job_id, attempt, status = %status.status, "unexpected job status");
                        return Err(PollError::UnexpectedStatus {
                            job_id: job_id.clone(),
                            status: status.status,
                        });
                    }
                    UnknownStatusPolicy::KeepPolling => {
                        warn!(%job_id, attempt, status = %status.status, "unrecognized job status; continuing to poll");
                        on_status(&status);
                    }
                },
                // A bare status record claiming completion carries no result.
                StatusClass::Completed => {
                    warn!(%job_id, attempt, "completed status without a result payload");
                    return Err(PollError::UnexpectedStatus {
                        job_id: job_id.clone(),
                        status: status.status,
                    });
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!(%job_id, attempt, "polling stopped by cancellation");
                        return Ok(PollOutcome::CancelledLocally);
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }

        if cancel.is_cancelled() {
            return Ok(PollOutcome::CancelledLocally);
        }

        let snapshot =
            PendingJobSnapshot::new(job_id.clone(), latest_backend, &target.runtime);
        let snapshot = match self.store.save(&snapshot) {
            Ok(()) => {
                warn!(%job_id, attempts = max_attempts, "polling budget exhausted; job saved for resume");
                Some(snapshot)
            }
            Err(err) => {
                warn!(%job_id, error = %err, "failed to persist snapshot for timed-out job");
                None
            }
        };

        Err(PollError::TimedOut {
            job_id: job_id.clone(),
            attempts: max_attempts,
            snapshot,
        })
    }

    fn clear_snapshot(&self, job_id: &JobId) {
        if let Err(err) = self.store.clear() {
            warn!(%job_id, error = %err, "failed to clear pending job snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;
    use qknot_model::{JobStatusCode, RuntimeChannel};

    use super::*;
    use crate::snapshot::{MemorySnapshotStore, MockSnapshotStore};
    use crate::testing::ScriptedTransport;

    fn target() -> PollTarget {
        PollTarget {
            job_id: "job-7".into(),
            backend: None,
            runtime: RuntimeSelection::new(
                RuntimeChannel::parse("ibm_cloud"),
                None,
            ),
        }
    }

    fn config(max_attempts: u32) -> PollConfig {
        PollConfig {
            max_attempts,
            interval_ms: 1_000,
            ..PollConfig::default()
        }
    }

    fn status(code: &str) -> JobStatus {
        JobStatus::new("job-7".into(), JobStatusCode::parse(code))
            .with_backend("ibm_kyiv")
    }

    #[test]
    fn policy_parses_both_spellings() {
        assert_eq!(
            "keep_polling".parse::<UnknownStatusPolicy>(),
            Ok(UnknownStatusPolicy::KeepPolling)
        );
        assert_eq!(
            " FAIL ".parse::<UnknownStatusPolicy>(),
            Ok(UnknownStatusPolicy::Fail)
        );
        assert!("retry".parse::<UnknownStatusPolicy>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_attempts_saves_snapshot_and_times_out() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.repeat_poll_status(status("RUNNING"));
        let store = Arc::new(MemorySnapshotStore::new());
        let poll = PollLoop::new(transport.clone(), store.clone(), config(3));

        let started = tokio::time::Instant::now();
        let mut seen = Vec::new();
        let err = poll
            .run(&target(), &CancellationToken::new(), |s| {
                seen.push(s.status.clone())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::TimedOut { attempts: 3, .. }));
        assert_eq!(transport.poll_count(), 3);
        assert_eq!(seen.len(), 3);
        // Two delays between three polls, none after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(2));

        let saved = store.current().expect("snapshot saved on timeout");
        assert_eq!(saved.job_id.as_str(), "job-7");
        assert_eq!(saved.backend.as_deref(), Some("ibm_kyiv"));
        assert_eq!(saved.runtime_channel.as_deref(), Some("ibm_cloud"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_with_failed_save_reports_no_snapshot() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.repeat_poll_status(status("RUNNING"));

        let mut store = MockSnapshotStore::new();
        store.expect_save().times(1).returning(|_| {
            Err(crate::error::SnapshotError::Io(std::io::Error::other("disk full")))
        });
        store.expect_clear().never();

        let poll = PollLoop::new(transport, Arc::new(store), config(2));
        let err = poll
            .run(&target(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PollError::TimedOut { attempts: 2, snapshot: None, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_clears_snapshot_and_surfaces_detail() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_poll_status(status("QUEUED"));
        transport.push_poll_status(
            status("FAILED").with_detail("Calibration drift detected"),
        );

        let mut store = MockSnapshotStore::new();
        store.expect_clear().times(1).returning(|| Ok(()));
        store.expect_save().never();

        let poll = PollLoop::new(transport, Arc::new(store), config(10));
        let err = poll
            .run(&target(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Calibration drift detected");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_without_detail_names_the_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_poll_status(status("CANCELLED"));
        let poll = PollLoop::new(
            transport,
            Arc::new(MemorySnapshotStore::new()),
            config(10),
        );

        let err = poll
            .run(&target(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "job failed with status CANCELLED");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_fails_by_default() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_poll_status(status("PAUSED"));

        let mut store = MockSnapshotStore::new();
        store.expect_clear().times(1).returning(|| Ok(()));

        let poll = PollLoop::new(transport.clone(), Arc::new(store), config(10));
        let err = poll
            .run(&target(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::UnexpectedStatus { .. }));
        assert_eq!(transport.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_can_keep_polling() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_poll_status(status("PAUSED"));
        transport.push_poll_result(crate::testing::sample_result("job-7"));

        let poll = PollLoop::new(
            transport.clone(),
            Arc::new(MemorySnapshotStore::new()),
            PollConfig {
                unknown_status: UnknownStatusPolicy::KeepPolling,
                ..config(10)
            },
        );
        let outcome = poll
            .run(&target(), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Completed(_)));
        assert_eq!(transport.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_delay_stops_without_writes() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.repeat_poll_status(status("RUNNING"));

        let mut store = MockSnapshotStore::new();
        store.expect_save().with(always()).never();
        store.expect_clear().never();

        let poll = PollLoop::new(transport.clone(), Arc::new(store), config(50));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            trigger.cancel();
        });

        let outcome = poll.run(&target(), &token, |_| {}).await.unwrap();
        assert_eq!(outcome, PollOutcome::CancelledLocally);
        assert_eq!(transport.poll_count(), 3);
    }

    #[tokio::test]
    async fn transport_failure_leaves_snapshot_untouched() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_poll_error(crate::error::TransportError::Server {
            status: 502,
            detail: "bad gateway".into(),
        });

        let mut store = MockSnapshotStore::new();
        store.expect_save().never();
        store.expect_clear().never();

        let poll = PollLoop::new(transport, Arc::new(store), config(5));
        let err = poll
            .run(&target(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "server error (502): bad gateway");
    }
}
