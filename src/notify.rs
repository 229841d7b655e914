//! Build status notifications for the chat channel

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Buildbot's `SUCCESS` result code.
pub const DEFAULT_SUCCESS_CODE: i64 = 0;

pub const NOTIFY_CHANNEL: &str = "ci";
pub const NOTIFY_USERNAME: &str = "buildbot";

/// Options for the `[notify]` table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NotifyConfig {
    #[serde(default = "default_success_code")]
    pub success_code: i64,
}

fn default_success_code() -> i64 {
    DEFAULT_SUCCESS_CODE
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            success_code: DEFAULT_SUCCESS_CODE,
        }
    }
}

/// Reads any JSON value and falls back to the default when it is `null` or
/// has an unexpected type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// A build as Buildbot hands it to reporters. Only the fields the message
/// needs are read; each may be missing, `null` or mistyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub builder: Option<BuilderInfo>,
    /// Build properties, each a `[value, source]` pair.
    #[serde(default, deserialize_with = "lenient")]
    pub properties: HashMap<String, serde_json::Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub complete: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub results: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

impl BuildEvent {
    /// Value half of a property; bare string values are accepted too.
    pub fn property(&self, name: &str) -> Option<&str> {
        match self.properties.get(name)? {
            serde_json::Value::Array(pair) => pair.first()?.as_str(),
            value => value.as_str(),
        }
    }
}

/// The resolved fields a notification is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEventSnapshot {
    pub builder_name: String,
    pub branch: String,
    pub complete: bool,
    pub result_code: Option<i64>,
    pub url: String,
}

impl From<&BuildEvent> for BuildEventSnapshot {
    fn from(event: &BuildEvent) -> Self {
        Self {
            builder_name: event
                .builder
                .as_ref()
                .and_then(|b| b.name.clone())
                .unwrap_or_default(),
            branch: event.property("branch").unwrap_or_default().to_string(),
            complete: event.complete,
            result_code: event.results,
            url: event.url.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Building,
    Success,
    Failure,
}

impl BuildStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            BuildStatus::Building => ":rocket:",
            BuildStatus::Success => ":white_check_mark:",
            BuildStatus::Failure => ":x:",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            BuildStatus::Building => "Building",
            BuildStatus::Success | BuildStatus::Failure => "Finished",
        }
    }
}

/// Message posted to the chat incoming webhook.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatNotification {
    pub channel: String,
    pub username: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFormatter {
    success_code: i64,
}

impl Default for StatusFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_CODE)
    }
}

impl From<&NotifyConfig> for StatusFormatter {
    fn from(config: &NotifyConfig) -> Self {
        Self::new(config.success_code)
    }
}

impl StatusFormatter {
    pub fn new(success_code: i64) -> Self {
        Self { success_code }
    }

    /// Result codes only count once the build is complete; an absent code
    /// on a complete build is a failure.
    pub fn status(&self, event: &BuildEventSnapshot) -> BuildStatus {
        if !event.complete {
            BuildStatus::Building
        } else if event.result_code == Some(self.success_code) {
            BuildStatus::Success
        } else {
            BuildStatus::Failure
        }
    }

    pub fn format(&self, event: &BuildEventSnapshot) -> ChatNotification {
        let status = self.status(event);
        ChatNotification {
            channel: NOTIFY_CHANNEL.to_string(),
            username: NOTIFY_USERNAME.to_string(),
            text: format!(
                "{} {} {} at {} : {}\n",
                status.glyph(),
                status.verb(),
                event.builder_name,
                event.branch,
                event.url
            ),
        }
    }
}
