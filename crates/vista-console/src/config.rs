use std::{str::FromStr, time::Duration};

use thiserror::Error;
use vista_core::{ControllerConfig, NotificationConfig};
use vista_model::{AlertStatus, ModelError, RiskLevel};
use vista_observe::{LoggerConfig, LoggerError, LoggerFormat};

pub const ENV_LOG_FORMAT: &str = "VISTA_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "VISTA_LOG_LEVEL";
pub const ENV_LOAD_DEADLINE_MS: &str = "VISTA_LOAD_DEADLINE_MS";
pub const ENV_LATENCY_MS: &str = "VISTA_LATENCY_MS";
pub const ENV_ALERT_RISK: &str = "VISTA_ALERT_RISK";
pub const ENV_ALERT_STATUS: &str = "VISTA_ALERT_STATUS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: expected a number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },

    #[error("{var}: {source}")]
    Filter {
        var: &'static str,
        #[source]
        source: ModelError,
    },

    #[error("{var}: {source}")]
    Logger {
        var: &'static str,
        #[source]
        source: LoggerError,
    },
}

/// Everything the console needs at startup.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub logger: LoggerConfig,
    pub controller: ControllerConfig,
    pub notifications: NotificationConfig,
    /// Delay of every mocked load and write.
    pub latency: Duration,
    /// Initial risk filter of the alerts section; `None` shows every level.
    pub alert_risk: Option<RiskLevel>,
    pub alert_status: Option<AlertStatus>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            controller: ControllerConfig::default(),
            notifications: NotificationConfig::default(),
            latency: Duration::from_millis(800),
            alert_risk: None,
            alert_status: None,
        }
    }
}

impl ConsoleConfig {
    /// Defaults overridden by `VISTA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            let format = raw.parse::<LoggerFormat>().map_err(|source| ConfigError::Logger {
                var: ENV_LOG_FORMAT,
                source,
            })?;
            cfg.logger = cfg.logger.with_format(format);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            cfg.logger = cfg.logger.with_level(level);
        }
        if let Some(raw) = lookup(ENV_LOAD_DEADLINE_MS) {
            let deadline = millis(ENV_LOAD_DEADLINE_MS, &raw)?;
            cfg.controller = cfg.controller.with_load_deadline(deadline);
        }
        if let Some(raw) = lookup(ENV_LATENCY_MS) {
            cfg.latency = millis(ENV_LATENCY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ALERT_RISK) {
            cfg.alert_risk = filter(ENV_ALERT_RISK, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ALERT_STATUS) {
            cfg.alert_status = filter(ENV_ALERT_STATUS, &raw)?;
        }
        Ok(cfg)
    }
}

fn millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidMillis {
            var,
            value: raw.to_string(),
        })
}

/// Empty or `all` means no filter.
fn filter<T>(var: &'static str, raw: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = ModelError>,
{
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|source| ConfigError::Filter { var, source })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.controller, ControllerConfig::default());
        assert_eq!(cfg.latency, Duration::from_millis(800));
        assert_eq!(cfg.logger.format, LoggerFormat::Text);
        assert_eq!(cfg.alert_risk, None);
        assert_eq!(cfg.alert_status, None);
    }

    #[test]
    fn alert_filters_parse() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[
            (ENV_ALERT_RISK, "Critical"),
            (ENV_ALERT_STATUS, "in-progress"),
        ]))
        .unwrap();
        assert_eq!(cfg.alert_risk, Some(RiskLevel::Critical));
        assert_eq!(cfg.alert_status, Some(AlertStatus::InProgress));

        let cfg = ConsoleConfig::from_lookup(lookup(&[(ENV_ALERT_RISK, "all"), (ENV_ALERT_STATUS, " ")])).unwrap();
        assert_eq!(cfg.alert_risk, None);
        assert_eq!(cfg.alert_status, None);

        let err = ConsoleConfig::from_lookup(lookup(&[(ENV_ALERT_RISK, "severe")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Filter {
                var: ENV_ALERT_RISK,
                source: ModelError::UnknownVariant { kind: "risk level", .. }
            }
        ));
        assert_eq!(err.to_string(), "VISTA_ALERT_RISK: unknown risk level value: severe");
    }

    #[test]
    fn overrides_apply() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[
            (ENV_LOG_FORMAT, "json"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOAD_DEADLINE_MS, "250"),
            (ENV_LATENCY_MS, " 40 "),
        ]))
        .unwrap();
        assert_eq!(cfg.logger.format, LoggerFormat::Json);
        assert_eq!(cfg.logger.level, "debug");
        assert_eq!(cfg.controller.load_deadline, Duration::from_millis(250));
        assert_eq!(cfg.latency, Duration::from_millis(40));
    }

    #[test]
    fn bad_values_are_reported() {
        let err = ConsoleConfig::from_lookup(lookup(&[(ENV_LATENCY_MS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMillis { var: ENV_LATENCY_MS, .. }));

        let err = ConsoleConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(err.to_string().starts_with(ENV_LOG_FORMAT));
    }
}
