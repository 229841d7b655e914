//! HTTP handlers hosting command intake and status notifications

pub mod command;
pub mod notify;
pub mod stats;

use axum::{Router, routing};

use crate::SharedState;

// Re-export handlers
pub use command::{SlashCommandResponse, handle_build_command};
pub use notify::handle_build_event;
pub use stats::{root, status};

/// All routes of the bridge. The slash command is accepted both as a form
/// POST and as a GET, where axum's `Form` reads the query string.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route(
            "/change_hook/mattermost",
            routing::get(handle_build_command).post(handle_build_command),
        )
        .route("/notify", routing::post(handle_build_event))
        .route("/status", routing::get(status))
        .with_state(state)
}
