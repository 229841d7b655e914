//! Slash command handler for `/build`

use axum::{Form, Json, extract::State as AxumState, http::StatusCode};
use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::error::BridgeError;
use crate::intake::{BuildRequest, intake};
use crate::trigger::run_trigger_script;
use crate::webhook::{InboundCommand, WebhookArgs};

const USAGE: &str = "Usage: /build <repo> [branch] [revision]";
const BUSY: &str = ":hourglass: Too many builds waiting to be triggered, try again later";

/// Who sees the reply to a slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Only visible to the user who invoked the command.
    Ephemeral,
    /// Visible to everyone in the channel.
    InChannel,
}

/// Immediate reply to a slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlashCommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl SlashCommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
        }
    }

    fn queued(change: &BuildRequest) -> Self {
        let revision = if change.revision.is_empty() {
            "latest"
        } else {
            change.revision.as_str()
        };
        Self::in_channel(format!(
            ":hammer: Build queued for {}\nrepository: {}\nbranch: {}\nrevision: {}",
            change.project, change.repository, change.branch, revision
        ))
    }

    /// Maps a rejected command to the status code and reply for the caller.
    fn rejected(err: &BridgeError) -> (StatusCode, Self) {
        match err {
            BridgeError::AuthError(reason) => (
                StatusCode::UNAUTHORIZED,
                Self::ephemeral(format!("Unauthorized: {}", reason)),
            ),
            BridgeError::ParseError(reason) => (
                StatusCode::OK,
                Self::ephemeral(format!("{} ({})", USAGE, reason)),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Self::ephemeral("Internal error"),
            ),
        }
    }
}

/// Handles the Mattermost slash command, sent either as a form body or a query string.
///
/// With a trigger script configured, each accepted change holds one of
/// `MAX_PENDING_TRIGGERS` slots until its script finishes; when none is
/// free the command is refused with 503.
pub async fn handle_build_command(
    AxumState(state): AxumState<SharedState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> (StatusCode, Json<SlashCommandResponse>) {
    let request_id = Uuid::now_v7();
    let span = info_span!("build_command", %request_id);
    let _enter = span.enter();

    let args = WebhookArgs::from_pairs(pairs);
    let cmd = InboundCommand::from(&args);
    debug!(
        "Command {:?} from channel {:?} with text {:?}",
        cmd.command_name, cmd.channel_name, cmd.text
    );

    let change = match intake(state.config.intake.as_ref(), &cmd) {
        Ok(change) => change,
        Err(e) => {
            match &e {
                BridgeError::AuthError(_) => warn!(
                    "Rejected command from channel {:?}: {}",
                    cmd.channel_name, e
                ),
                BridgeError::ParseError(_) => info!("Invalid command: {}", e),
                _ => error!("Cannot handle command: {}", e),
            }
            let (status, reply) = SlashCommandResponse::rejected(&e);
            return (status, Json(reply));
        }
    };

    info!(
        "Accepted change for project '{}' (repository '{}', branch '{}', revision '{}')",
        change.project, change.repository, change.branch, change.revision
    );

    match state.config.trigger_script() {
        Some(script) => {
            let Ok(slot) = state.trigger_slots.clone().try_acquire_owned() else {
                warn!(
                    "Trigger backlog full; refusing change for project '{}'",
                    change.project
                );
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(SlashCommandResponse::ephemeral(BUSY)),
                );
            };
            let script = script.to_string();
            let shared_state = state.clone();
            let trigger_change = change.clone();
            tokio::spawn(
                async move {
                    let _slot = slot;
                    // Only one trigger runs at a time.
                    let _guard = shared_state.trigger_lock.lock().await;
                    if let Err(e) = run_trigger_script(&script, &trigger_change).await {
                        error!(
                            "Trigger for project '{}' failed: {}",
                            trigger_change.project, e
                        );
                    }
                }
                .instrument(span.clone()),
            );
        }
        None => match serde_json::to_string(&change.clone().into_change_response()) {
            Ok(json) => info!("No trigger configured; change: {}", json),
            Err(e) => error!("Failed to serialize change: {}", e),
        },
    }

    (StatusCode::OK, Json(SlashCommandResponse::queued(&change)))
}
