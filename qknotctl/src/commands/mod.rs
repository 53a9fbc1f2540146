mod inspect;
mod job;

use std::sync::Arc;

use anyhow::{Context, Result};
use qknot_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use qknot_core::{FileSnapshotStore, HttpTransport, LifecycleController};
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, Command};

pub async fn run(cli: Cli) -> Result<()> {
    // Validation is purely local; no config or network needed.
    if let Command::Validate { braid } = &cli.command {
        return inspect::validate(braid);
    }

    let load = load_config(&cli)?;
    let controller = build_controller(&load)?;

    match cli.command {
        Command::Validate { .. } => Ok(()),
        Command::Submit(args) => job::submit(&controller, args).await,
        Command::Resume => job::resume(&controller).await,
        Command::Status => inspect::status(&controller, &load),
        Command::Discard => inspect::discard(&controller),
        Command::Backends {
            runtime,
            min_qubits,
        } => inspect::backends(&controller, &runtime, min_qubits).await,
    }
}

fn load_config(cli: &Cli) -> Result<ConfigLoad> {
    let loader = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: cli.env_file.clone(),
        skip_env_file: false,
    });
    loader.load().context("failed to load configuration")
}

fn build_controller(load: &ConfigLoad) -> Result<LifecycleController> {
    let config = &load.config;
    let transport = HttpTransport::new(
        &config.backend.base_url,
        config.backend.request_timeout,
    )
    .context("failed to configure backend transport")?;
    let store = FileSnapshotStore::new(&config.snapshot.path);

    let controller = LifecycleController::new(
        Arc::new(transport),
        Arc::new(store),
        config.poll.clone(),
    )
    .with_completion_callback(|result| {
        info!(
            job_id = %result.job_id,
            backend = %result.backend,
            "job completed"
        );
    });
    Ok(controller)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .context("failed to encode output")?;
    println!("{text}");
    Ok(())
}
