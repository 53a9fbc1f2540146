use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use qknot_core::PollConfig;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const SNAPSHOT_FILE_NAME: &str = "pending_job.json";

/// Which input produced the file-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    /// `QKNOT_CONFIG_PATH`.
    EnvPath(PathBuf),
    /// `QKNOT_CONFIG_JSON`.
    EnvInline,
    /// An explicit path or a well-known file in the working directory.
    File(PathBuf),
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Default => "built-in defaults".to_string(),
            ConfigSource::EnvPath(path) => {
                format!("QKNOT_CONFIG_PATH ({})", path.display())
            }
            ConfigSource::EnvInline => "QKNOT_CONFIG_JSON".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QknotConfig {
    pub backend: BackendConfig,
    pub poll: PollConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Root of the execution service, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// File holding the single pending-job record.
    pub path: PathBuf,
}

impl SnapshotConfig {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

/// `pending_job.json` under the platform data directory, or under
/// `./.qknot` when no home directory can be resolved.
pub fn default_snapshot_path() -> PathBuf {
    ProjectDirs::from("", "qknot", "qknot")
        .map(|dirs| dirs.data_dir().join(SNAPSHOT_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(".qknot").join(SNAPSHOT_FILE_NAME))
}
