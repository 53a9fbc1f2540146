use anyhow::{Result, anyhow};
use qknot_config::ConfigLoad;
use qknot_core::{LifecycleController, validate_braid_word};
use serde_json::json;

use super::print_json;
use crate::cli::RuntimeArgs;

pub fn validate(braid: &str) -> Result<()> {
    let analysis = validate_braid_word(braid).map_err(|err| anyhow!(err))?;
    print_json(&analysis)
}

pub fn status(controller: &LifecycleController, load: &ConfigLoad) -> Result<()> {
    let pending = controller.pending_snapshot();
    print_json(&json!({
        "pending_job": pending,
        "resumable": pending.as_ref().is_some_and(|p| p.is_resumable()),
        "snapshot_path": load.config.snapshot.path,
        "config_source": load.source.describe(),
    }))
}

pub fn discard(controller: &LifecycleController) -> Result<()> {
    let discarded = controller.discard_pending()?;
    print_json(&json!({ "discarded": discarded }))
}

pub async fn backends(
    controller: &LifecycleController,
    runtime: &RuntimeArgs,
    min_qubits: Option<u32>,
) -> Result<()> {
    let mut catalog = controller.list_capabilities(&runtime.selection()).await?;
    if let Some(required) = min_qubits {
        catalog.backends = catalog
            .candidates(required)
            .into_iter()
            .cloned()
            .collect();
    }
    print_json(&catalog)
}
