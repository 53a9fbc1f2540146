use std::{fmt, time::Duration};

use thiserror::Error;
use url::Url;

use crate::models::QknotConfig;

/// Hard failures: the configuration cannot drive a controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("poll.max_attempts must be at least 1")]
    ZeroPollAttempts,
    #[error("backend URL '{url}' is invalid: {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    #[error("backend URL '{url}' must use http or https, got '{scheme}'")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("backend request timeout must be greater than zero")]
    ZeroRequestTimeout,
}

/// Soft findings reported alongside a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    ZeroPollInterval,
    ShortPollBudget { budget: Duration },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::ZeroPollInterval => {
                f.write_str("poll interval is zero; status requests will be sent back to back")
            }
            ConfigWarning::ShortPollBudget { budget } => write!(
                f,
                "total poll budget is only {}; hardware queues often take longer",
                humantime::format_duration(*budget)
            ),
        }
    }
}

const SHORT_BUDGET: Duration = Duration::from_secs(60);

pub fn validate(
    config: &QknotConfig,
) -> Result<Vec<ConfigWarning>, ConfigGuardRailError> {
    if config.poll.max_attempts == 0 {
        return Err(ConfigGuardRailError::ZeroPollAttempts);
    }
    if config.backend.request_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroRequestTimeout);
    }

    let raw = config.backend.base_url.as_str();
    let parsed =
        Url::parse(raw).map_err(|err| ConfigGuardRailError::InvalidBackendUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigGuardRailError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: parsed.scheme().to_string(),
        });
    }

    let mut warnings = Vec::new();
    let interval = config.poll.interval();
    if interval.is_zero() {
        warnings.push(ConfigWarning::ZeroPollInterval);
    } else {
        let budget = interval.saturating_mul(config.poll.max_attempts);
        if budget < SHORT_BUDGET {
            warnings.push(ConfigWarning::ShortPollBudget { budget });
        }
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_without_warnings() {
        assert_eq!(validate(&QknotConfig::default()), Ok(Vec::new()));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut config = QknotConfig::default();
        config.poll.max_attempts = 0;
        assert_eq!(validate(&config), Err(ConfigGuardRailError::ZeroPollAttempts));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let mut config = QknotConfig::default();
        config.backend.base_url = "ftp://example.org".into();
        assert!(matches!(
            validate(&config),
            Err(ConfigGuardRailError::UnsupportedScheme { ref scheme, .. }) if scheme == "ftp"
        ));
    }

    #[test]
    fn relative_url_is_rejected() {
        let mut config = QknotConfig::default();
        config.backend.base_url = "localhost-without-scheme".into();
        assert!(matches!(
            validate(&config),
            Err(ConfigGuardRailError::InvalidBackendUrl { .. })
        ));
    }

    #[test]
    fn tiny_budget_is_a_warning() {
        let mut config = QknotConfig::default();
        config.poll.max_attempts = 3;
        config.poll.interval_ms = 1_000;
        assert_eq!(
            validate(&config),
            Ok(vec![ConfigWarning::ShortPollBudget {
                budget: Duration::from_secs(3)
            }])
        );
    }
}
