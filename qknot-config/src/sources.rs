use std::path::PathBuf;

use qknot_core::UnknownStatusPolicy;
use serde::{Deserialize, Serialize};

/// Raw configuration as written in a TOML or JSON file. Every field is
/// optional; absent values fall back to defaults.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FileConfig {
    pub backend: FileBackendConfig,
    pub poll: FilePollConfig,
    pub snapshot: FileSnapshotConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileBackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Human-readable duration such as `90s` or `2m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilePollConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Human-readable duration such as `5s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_status: Option<UnknownStatusPolicy>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSnapshotConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// `QKNOT_*` variables captured as raw strings. Parsing happens during
/// composition so malformed values can be reported with their name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub config_json: Option<String>,
    pub backend_url: Option<String>,
    pub request_timeout: Option<String>,
    pub max_poll_attempts: Option<String>,
    pub poll_interval: Option<String>,
    pub poll_interval_seconds: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub unknown_status: Option<String>,
}

impl EnvConfig {
    pub const CONFIG_PATH: &'static str = "QKNOT_CONFIG_PATH";
    pub const CONFIG_JSON: &'static str = "QKNOT_CONFIG_JSON";
    pub const BACKEND_URL: &'static str = "QKNOT_BACKEND_URL";
    pub const REQUEST_TIMEOUT: &'static str = "QKNOT_REQUEST_TIMEOUT";
    pub const MAX_POLL_ATTEMPTS: &'static str = "QKNOT_MAX_POLL_ATTEMPTS";
    pub const POLL_INTERVAL: &'static str = "QKNOT_POLL_INTERVAL";
    pub const POLL_INTERVAL_SECONDS: &'static str =
        "QKNOT_POLL_INTERVAL_SECONDS";
    pub const SNAPSHOT_PATH: &'static str = "QKNOT_SNAPSHOT_PATH";
    pub const UNKNOWN_STATUS: &'static str = "QKNOT_UNKNOWN_STATUS";

    /// Read from the process environment.
    pub fn gather() -> Self {
        Self::gather_with(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`. Blank values count as unset.
    pub fn gather_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        Self {
            config_path: var(Self::CONFIG_PATH).map(PathBuf::from),
            config_json: var(Self::CONFIG_JSON),
            backend_url: var(Self::BACKEND_URL),
            request_timeout: var(Self::REQUEST_TIMEOUT),
            max_poll_attempts: var(Self::MAX_POLL_ATTEMPTS),
            poll_interval: var(Self::POLL_INTERVAL),
            poll_interval_seconds: var(Self::POLL_INTERVAL_SECONDS),
            snapshot_path: var(Self::SNAPSHOT_PATH).map(PathBuf::from),
            unknown_status: var(Self::UNKNOWN_STATUS),
        }
    }
}
