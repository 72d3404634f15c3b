use std::env;
use std::time::Duration;
use log::info;
use rv_core::orchestrator::{OrchestratorConfig, DEFAULT_POLL_INTERVAL};
use crate::error::AppError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "veo-3.1-fast-generate-preview";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub model: String,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_duration: Option<Duration>,
}

impl AppConfig {
    /// Read settings from `.env` (if present) and the process environment
    pub fn load() -> anyhow::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self::from_lookup(|name| env::var(name).ok())?)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_base = lookup("REVERIE_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let model = lookup("REVERIE_MODEL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let http_timeout = secs(&lookup, "REVERIE_HTTP_TIMEOUT_SECS")?
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));

        let poll_interval = secs(&lookup, "REVERIE_POLL_INTERVAL_SECS")?.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(AppError::Config {
                name: "REVERIE_POLL_INTERVAL_SECS".into(),
                value: "0".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let max_poll_duration = secs(&lookup, "REVERIE_MAX_POLL_SECS")?;

        Ok(Self {
            api_base,
            model,
            http_timeout,
            poll_interval,
            max_poll_duration,
        })
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            poll_interval: self.poll_interval,
            max_poll_duration: self.max_poll_duration,
        }
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<Duration>, AppError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<u64>()
        .map(|s| Some(Duration::from_secs(s)))
        .map_err(|e| AppError::Config {
            name: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.max_poll_duration, None);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("REVERIE_API_BASE", "http://localhost:8080/v1/"),
            ("REVERIE_MODEL", "veo-2.0-generate-001"),
            ("REVERIE_POLL_INTERVAL_SECS", "5"),
            ("REVERIE_MAX_POLL_SECS", "600"),
        ]))
        .unwrap();

        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.model, "veo-2.0-generate-001");
        assert_eq!(config.orchestrator().poll_interval, Duration::from_secs(5));
        assert_eq!(config.orchestrator().max_poll_duration, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_bad_number_is_error() {
        let err = AppConfig::from_lookup(lookup(&[("REVERIE_POLL_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AppError::Config { ref name, .. } if name == "REVERIE_POLL_INTERVAL_SECS"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("REVERIE_POLL_INTERVAL_SECS", "0")])).is_err());
    }
}
