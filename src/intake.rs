//! `/build` command intake: authentication and translation into a Buildbot change

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BridgeError, Result};
use crate::webhook::InboundCommand;

pub const BUILD_COMMAND: &str = "/build";
pub const DEFAULT_BRANCH: &str = "master";

const CHANGE_AUTHOR: &str = "buildbot";
const CHANGE_CATEGORY: &str = "mattermost";
const CHANGE_COMMENTS: &str = "Build from mattermost";

/// Intake options, read once at startup from the `[intake]` table.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct IntakeConfig {
    pub token: Option<String>,
    pub repo_base_url: Option<String>,
    pub channel: Option<String>,
}

/// Positional arguments of `/build <repo> [branch] [revision]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub repo: String,
    pub branch: String,
    pub revision: String,
}

impl BuildSpec {
    /// Split the command text on whitespace. Tokens past the revision are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut args = text.split_whitespace();
        let repo = args
            .next()
            .ok_or_else(|| BridgeError::ParseError("missing parameters".to_string()))?;
        let branch = args.next().unwrap_or(DEFAULT_BRANCH);
        let revision = args.next().unwrap_or_default();

        Ok(Self {
            repo: repo.to_string(),
            branch: branch.to_string(),
            revision: revision.to_string(),
        })
    }

    pub fn project(&self) -> String {
        format!("mattermost_build_{}_{}", self.repo, self.branch)
    }
}

/// A Buildbot change descriptor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BuildRequest {
    pub author: String,
    pub branch: String,
    pub category: String,
    pub comments: String,
    pub files: Vec<String>,
    pub project: String,
    pub properties: HashMap<String, String>,
    pub repository: String,
    pub revision: String,
    pub revlink: String,
}

impl BuildRequest {
    fn new(spec: BuildSpec, repo_base_url: &str) -> Self {
        Self {
            author: CHANGE_AUTHOR.to_string(),
            category: CHANGE_CATEGORY.to_string(),
            comments: CHANGE_COMMENTS.to_string(),
            files: Vec::new(),
            project: spec.project(),
            properties: HashMap::new(),
            repository: format!("{}{}", repo_base_url, spec.repo),
            revlink: String::new(),
            branch: spec.branch,
            revision: spec.revision,
        }
    }

    pub fn into_change_response(self) -> ChangeHookResponse {
        ChangeHookResponse(vec![self], None)
    }
}

/// What a Buildbot change hook returns: the changes plus a null source.
/// Serializes as `[[change, ...], null]`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChangeHookResponse(pub Vec<BuildRequest>, pub Option<String>);

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BridgeError::ConfigError(format!(
            "missing option '{}'",
            name
        ))),
    }
}

/// Validate an inbound command against the intake options and translate it
/// into a change. Checks run in a fixed order and the first failure wins.
pub fn intake(config: Option<&IntakeConfig>, cmd: &InboundCommand) -> Result<BuildRequest> {
    let config = config.ok_or_else(|| BridgeError::ConfigError("missing options".to_string()))?;

    let token = required(config.token.as_deref(), "token")?;
    let repo_base_url = required(config.repo_base_url.as_deref(), "repo_base_url")?;

    if cmd.token.as_deref() != Some(token) {
        return Err(BridgeError::AuthError("invalid token".to_string()));
    }

    // An unset channel only matches commands that carry no channel either.
    if cmd.channel_name != config.channel {
        return Err(BridgeError::AuthError("channel not allowed".to_string()));
    }

    let spec = BuildSpec::parse(cmd.text.as_deref().unwrap_or_default())?;

    if cmd.command_name.as_deref() != Some(BUILD_COMMAND) {
        return Err(BridgeError::ParseError("unrecognized command".to_string()));
    }

    Ok(BuildRequest::new(spec, repo_base_url))
}
