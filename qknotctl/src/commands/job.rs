use std::future::Future;

use anyhow::{Context, Result, anyhow};
use qknot_core::{ControllerError, JobOutcome, LifecycleController};
use qknot_model::{CircuitSignature, JobSpecification, OptimizationLevel};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::print_json;
use crate::cli::SubmitArgs;

pub async fn submit(controller: &LifecycleController, args: SubmitArgs) -> Result<()> {
    let level = OptimizationLevel::new(args.optimization_level)
        .context("invalid optimization level")?;
    let spec = JobSpecification::new(&args.backend, &args.braid, args.shots)
        .with_optimization_level(level)
        .with_closure_method(args.closure.into())
        .with_runtime(args.runtime.selection());
    let expected = args.expected_signature.map(CircuitSignature::new);

    info!(backend = %spec.backend_name, shots = spec.shots, "submitting job");
    let outcome =
        with_interrupt(controller, controller.submit(spec, expected.as_ref()))
            .await;
    report(controller, outcome)
}

pub async fn resume(controller: &LifecycleController) -> Result<()> {
    if let Some(pending) = controller.pending_snapshot() {
        info!(job_id = %pending.job_id, "resuming pending job");
    }
    let outcome = with_interrupt(controller, controller.resume()).await;
    report(controller, outcome)
}

/// Drive `operation` while a Ctrl-C watcher asks the controller to cancel.
async fn with_interrupt<F>(
    controller: &LifecycleController,
    operation: F,
) -> Result<JobOutcome, ControllerError>
where
    F: Future<Output = Result<JobOutcome, ControllerError>>,
{
    let watcher = spawn_interrupt_watcher(controller.clone());
    let outcome = operation.await;
    watcher.abort();
    outcome
}

fn spawn_interrupt_watcher(controller: LifecycleController) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupt received; cancelling job");
        match controller.cancel().await {
            Ok(Some(status)) => {
                info!(job_id = %status.job_id, status = %status.status, "remote cancel acknowledged");
            }
            Ok(None) => info!("cancel requested before the job was accepted"),
            Err(err) => warn!(error = %err, "remote cancel failed"),
        }
    })
}

fn report(
    controller: &LifecycleController,
    outcome: Result<JobOutcome, ControllerError>,
) -> Result<()> {
    match outcome {
        Ok(JobOutcome::Completed(result)) => print_json(&result),
        Ok(JobOutcome::Cancelled) => {
            let view = controller.view();
            print_json(&json!({
                "outcome": "cancelled",
                "job_id": view.job_id,
                "last_status": view.last_status,
                "resumable": view.has_pending_job,
            }))
        }
        Err(err) if err.is_timeout() => Err(anyhow!(err).context(
            "polling budget exhausted; run `qknotctl resume` to keep waiting",
        )),
        Err(err) => Err(anyhow!(err)),
    }
}
