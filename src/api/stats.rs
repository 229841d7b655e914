//! Liveness and status endpoints

use axum::{Json, extract::State as AxumState};
use serde::Serialize;

use crate::SharedState;

pub async fn root() -> &'static str {
    "mattermost_buildbot"
}

/// Server status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub intake_configured: bool,
    pub trigger_configured: bool,
}

/// GET /status - Report uptime and which parts of the bridge are configured.
pub async fn status(AxumState(state): AxumState<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        started_at: state.started_at.to_rfc3339(),
        intake_configured: state.config.intake.is_some(),
        trigger_configured: state.config.trigger_script().is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, BridgeConfig};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_status_reports_configuration() {
        let config = BridgeConfig::from_toml("[intake]\ntoken = \"T\"").unwrap();
        let Json(resp) = status(AxumState(Arc::new(AppState::new(config)))).await;

        assert_eq!(resp.name, "mattermost_buildbot");
        assert!(resp.intake_configured);
        assert!(!resp.trigger_configured);
    }
}
