pub mod api;
pub mod error;
pub mod intake;
pub mod logging;
pub mod notify;
pub mod trigger;
pub mod webhook;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};

use error::{BridgeError, Result};
use intake::IntakeConfig;
use notify::{NotifyConfig, StatusFormatter};
use trigger::TriggerConfig;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct BridgeConfig {
    pub intake: Option<IntakeConfig>,
    #[serde(default)]
    pub notify: NotifyConfig,
    pub trigger: Option<TriggerConfig>,
}

impl BridgeConfig {
    pub fn from_toml(config_str: &str) -> Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn trigger_script(&self) -> Option<&str> {
        self.trigger.as_ref().and_then(TriggerConfig::script)
    }
}

/// Load and parse the configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<BridgeConfig> {
    let path = path.as_ref();
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::ConfigError(format!("Failed to read config file {:?}: {}", path, e))
    })?;

    BridgeConfig::from_toml(&config_str).map_err(|e| {
        BridgeError::ConfigError(format!("Failed to parse config file {:?}: {}", path, e))
    })
}

/// Accepted changes that may be running or waiting for the trigger script.
pub const MAX_PENDING_TRIGGERS: usize = 8;

pub struct AppState {
    /// Held while a trigger script runs so only one runs at a time.
    pub trigger_lock: Mutex<()>,
    /// One permit per running or waiting trigger, capping the backlog at
    /// `MAX_PENDING_TRIGGERS`.
    pub trigger_slots: Arc<Semaphore>,
    pub config: BridgeConfig,
    pub formatter: StatusFormatter,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            trigger_lock: Mutex::new(()),
            trigger_slots: Arc::new(Semaphore::new(MAX_PENDING_TRIGGERS)),
            formatter: StatusFormatter::from(&config.notify),
            config,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = BridgeConfig::from_toml(
            r#"
            [intake]
            token = "secret"
            repo_base_url = "https://git.example/"
            channel = "ci"

            [notify]
            success_code = 3

            [trigger]
            run_script = "./sendchange.sh"
            "#,
        )
        .unwrap();

        let intake = config.intake.as_ref().unwrap();
        assert_eq!(intake.token.as_deref(), Some("secret"));
        assert_eq!(intake.repo_base_url.as_deref(), Some("https://git.example/"));
        assert_eq!(intake.channel.as_deref(), Some("ci"));
        assert_eq!(config.notify.success_code, 3);
        assert_eq!(config.trigger_script(), Some("./sendchange.sh"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = BridgeConfig::from_toml("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.notify.success_code, notify::DEFAULT_SUCCESS_CODE);
        assert_eq!(config.trigger_script(), None);
    }

    #[test]
    fn test_partial_intake_table() {
        let config = BridgeConfig::from_toml("[intake]\ntoken = \"secret\"\n[notify]\n").unwrap();
        let intake = config.intake.unwrap();
        assert_eq!(intake.repo_base_url, None);
        assert_eq!(intake.channel, None);
        assert_eq!(config.notify.success_code, 0);
    }

    #[test]
    fn test_invalid_toml() {
        let err = BridgeConfig::from_toml("[intake\ntoken = 1").unwrap_err();
        assert!(matches!(err, BridgeError::TomlParseError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/bridge_config.toml").unwrap_err();
        assert!(matches!(err, BridgeError::ConfigError(_)));
    }

    #[test]
    fn test_state_uses_configured_success_code() {
        let config = BridgeConfig::from_toml("[notify]\nsuccess_code = 7").unwrap();
        let state = AppState::new(config);
        assert_eq!(state.formatter, StatusFormatter::new(7));
    }
}
