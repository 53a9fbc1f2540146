use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use once_cell::sync::Lazy;
use qknot_core::UnknownStatusPolicy;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    models::{ConfigSource, QknotConfig},
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarning},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("qknot.toml"),
        PathBuf::from("qknot.json"),
        PathBuf::from("config/qknot.toml"),
    ]
});

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("config file {path} does not exist")]
    MissingConfig { path: PathBuf },
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("invalid duration '{value}' for {field}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: QknotConfig,
    pub source: ConfigSource,
    pub env_file_loaded: bool,
    pub warnings: Vec<ConfigWarning>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// Takes precedence over `QKNOT_CONFIG_PATH`; must exist.
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Leave `.env` alone even if one is present.
    pub skip_env_file: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.options.skip_env_file = true;
        self
    }

    /// Load `.env` (if any), then resolve against the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let mut load = self.compose(EnvConfig::gather())?;
        load.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolve against `lookup` instead of the process environment. No
    /// `.env` file is read.
    pub fn load_with<F>(&self, lookup: F) -> Result<ConfigLoad, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.compose(EnvConfig::gather_with(lookup))
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        // A missing file is not an error; a malformed one is.
        let loaded = loaded.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err),
        })?;
        if loaded {
            debug!("loaded environment overrides from .env");
        }
        Ok(loaded)
    }

    fn compose(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file, source) = self.load_file_config(&env)?;
        let mut config = QknotConfig::default();

        apply_file(&mut config, file)?;
        apply_env(&mut config, &env)?;

        let warnings = validation::validate(&config)?;
        for warning in &warnings {
            warn!(%warning, "configuration warning");
        }
        info!(
            source = %source.describe(),
            base_url = %config.backend.base_url,
            max_attempts = config.poll.max_attempts,
            interval_ms = config.poll.interval_ms,
            "configuration loaded"
        );

        Ok(ConfigLoad {
            config,
            source,
            env_file_loaded: false,
            warnings,
        })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(FileConfig, ConfigSource), ConfigLoadError> {
        if let Some(path) = &self.options.config_path {
            if !path.exists() {
                return Err(ConfigLoadError::MissingConfig { path: path.clone() });
            }
            let file = read_config_file(path)?;
            return Ok((file, ConfigSource::File(path.clone())));
        }

        if let Some(path) = &env.config_path {
            if !path.exists() {
                return Err(ConfigLoadError::MissingConfig { path: path.clone() });
            }
            let file = read_config_file(path)?;
            return Ok((file, ConfigSource::EnvPath(path.clone())));
        }

        if let Some(raw) = &env.config_json {
            let file = serde_json::from_str(raw).map_err(|err| {
                ConfigLoadError::Parse {
                    origin: EnvConfig::CONFIG_JSON.to_string(),
                    message: err.to_string(),
                }
            })?;
            return Ok((file, ConfigSource::EnvInline));
        }

        if let Some(path) = DEFAULT_CONFIG_LOCATIONS
            .iter()
            .find(|candidate| candidate.exists())
        {
            let file = read_config_file(path)?;
            return Ok((file, ConfigSource::File(path.clone())));
        }

        Ok((FileConfig::default(), ConfigSource::Default))
    }
}

impl QknotConfig {
    /// Shorthand for [`ConfigLoader::load`] with default options.
    pub fn load_from_env() -> Result<ConfigLoad, ConfigLoadError> {
        ConfigLoader::new().load()
    }
}

pub fn read_config_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let origin = path.display().to_string();

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|err| {
            ConfigLoadError::Parse {
                origin,
                message: err.to_string(),
            }
        }),
        Some("toml") | Some("tml") => {
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                origin,
                message: err.to_string(),
            })
        }
        _ => parse_from_str(&contents, &origin),
    }
}

/// Try TOML first, then JSON.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> Result<FileConfig, ConfigLoadError> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            ConfigLoadError::Parse {
                origin: origin.to_string(),
                message: format!(
                    "toml error: {toml_err}; json error: {json_err}"
                ),
            }
        })
    })
}

fn apply_file(
    config: &mut QknotConfig,
    file: FileConfig,
) -> Result<(), ConfigLoadError> {
    if let Some(url) = file.backend.base_url {
        config.backend.base_url = url.trim().to_string();
    }
    if let Some(raw) = file.backend.request_timeout {
        config.backend.request_timeout =
            parse_duration("backend.request_timeout", &raw)?;
    }
    if let Some(attempts) = file.poll.max_attempts {
        config.poll.max_attempts = attempts;
    }
    if let Some(ms) = file.poll.interval_ms {
        config.poll.interval_ms = ms;
    }
    if let Some(raw) = file.poll.interval {
        config.poll.interval_ms =
            duration_ms(parse_duration("poll.interval", &raw)?);
    }
    if let Some(policy) = file.poll.unknown_status {
        config.poll.unknown_status = policy;
    }
    if let Some(path) = file.snapshot.path {
        config.snapshot.path = path;
    }
    Ok(())
}

fn apply_env(
    config: &mut QknotConfig,
    env: &EnvConfig,
) -> Result<(), ConfigLoadError> {
    if let Some(url) = &env.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(raw) = &env.request_timeout {
        config.backend.request_timeout =
            parse_duration(EnvConfig::REQUEST_TIMEOUT, raw)?;
    }
    if let Some(raw) = &env.max_poll_attempts {
        config.poll.max_attempts =
            raw.parse().map_err(|err: std::num::ParseIntError| {
                ConfigLoadError::InvalidEnv {
                    name: EnvConfig::MAX_POLL_ATTEMPTS,
                    value: raw.clone(),
                    reason: err.to_string(),
                }
            })?;
    }
    // The humantime form wins when both interval variables are set.
    if let Some(raw) = &env.poll_interval {
        config.poll.interval_ms =
            duration_ms(parse_duration(EnvConfig::POLL_INTERVAL, raw)?);
    } else if let Some(raw) = &env.poll_interval_seconds {
        config.poll.interval_ms = duration_ms(parse_seconds(raw)?);
    }
    if let Some(path) = &env.snapshot_path {
        config.snapshot.path = path.clone();
    }
    if let Some(raw) = &env.unknown_status {
        config.poll.unknown_status =
            raw.parse::<UnknownStatusPolicy>().map_err(|reason| {
                ConfigLoadError::InvalidEnv {
                    name: EnvConfig::UNKNOWN_STATUS,
                    value: raw.clone(),
                    reason,
                }
            })?;
    }
    Ok(())
}

fn parse_duration(
    field: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            field,
            value: raw.to_string(),
            source,
        }
    })
}

fn parse_seconds(raw: &str) -> Result<Duration, ConfigLoadError> {
    let invalid = |reason: String| ConfigLoadError::InvalidEnv {
        name: EnvConfig::POLL_INTERVAL_SECONDS,
        value: raw.to_string(),
        reason,
    };
    let seconds: f64 = raw.parse().map_err(|err: std::num::ParseFloatError| {
        invalid(err.to_string())
    })?;
    Duration::try_from_secs_f64(seconds).map_err(|err| invalid(err.to_string()))
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
