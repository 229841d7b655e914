//! Hand-off of accepted changes to the build master

use serde::Deserialize;
use tokio::process::Command;
use tracing::{error, info};

use crate::intake::BuildRequest;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TriggerConfig {
    /// Command run for every accepted change, e.g. a `buildbot sendchange` wrapper.
    pub run_script: Option<String>,
}

impl TriggerConfig {
    /// Returns the script if one is set and not blank.
    pub fn script(&self) -> Option<&str> {
        self.run_script
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// Environment exported to the trigger script.
pub fn trigger_env(change: &BuildRequest) -> Vec<(&'static str, String)> {
    let change_json = serde_json::to_string(&change.clone().into_change_response())
        .unwrap_or_default();

    vec![
        ("BUILD_REPOSITORY", change.repository.clone()),
        ("BUILD_BRANCH", change.branch.clone()),
        ("BUILD_REVISION", change.revision.clone()),
        ("BUILD_PROJECT", change.project.clone()),
        ("BUILD_CATEGORY", change.category.clone()),
        ("BUILD_AUTHOR", change.author.clone()),
        ("BUILD_COMMENTS", change.comments.clone()),
        ("BUILD_CHANGE_JSON", change_json),
    ]
}

/// Run `run_script` (split by whitespace into command + args) with the change
/// in its environment. Returns stdout, or stderr on failure.
pub async fn run_trigger_script(run_script: &str, change: &BuildRequest) -> Result<String, String> {
    let mut parts = run_script.split_whitespace();
    let script = parts.next().ok_or_else(|| {
        let msg = "run_script is empty".to_string();
        error!("{}", msg);
        msg
    })?;
    let args: Vec<&str> = parts.collect();

    info!("Running trigger for project '{}': {}", change.project, run_script);
    let output = Command::new(script)
        .args(&args)
        .envs(trigger_env(change))
        .output()
        .await
        .map_err(|e| {
            error!("run_script failed to start: {}", e);
            format!("run_script failed to start: {}", e)
        })?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        info!("run_script output:\n{}", stdout);
        Ok(stdout)
    } else {
        let msg = format!(
            "run_script failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
        error!("{}", msg);
        Err(msg)
    }
}
