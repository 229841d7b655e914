//! Build event notification endpoint

use axum::{Json, extract::State as AxumState};
use tracing::debug;

use crate::SharedState;
use crate::notify::{BuildEvent, BuildEventSnapshot, ChatNotification};

/// POST /notify - Format a Buildbot build event as a chat message.
pub async fn handle_build_event(
    AxumState(state): AxumState<SharedState>,
    Json(event): Json<BuildEvent>,
) -> Json<ChatNotification> {
    let snapshot = BuildEventSnapshot::from(&event);
    let notification = state.formatter.format(&snapshot);
    debug!("Notification for builder '{}': {:?}", snapshot.builder_name, notification.text);
    Json(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, BridgeConfig};
    use serde_json::json;
    use std::sync::Arc;

    fn event(value: serde_json::Value) -> Json<BuildEvent> {
        Json(serde_json::from_value(value).unwrap())
    }

    #[tokio::test]
    async fn test_building_event() {
        let state = Arc::new(AppState::new(BridgeConfig::default()));
        let Json(msg) = handle_build_event(
            AxumState(state),
            event(json!({
                "complete": false,
                "builder": {"name": "svc"},
                "properties": {"branch": ["main", "Build"]},
                "url": "http://x/1",
            })),
        )
        .await;

        assert_eq!(msg.channel, "ci");
        assert_eq!(msg.username, "buildbot");
        assert_eq!(msg.text, ":rocket: Building svc at main : http://x/1\n");
    }

    #[tokio::test]
    async fn test_finished_event_uses_configured_success_code() {
        let config = BridgeConfig::from_toml("[notify]\nsuccess_code = 5").unwrap();
        let state = Arc::new(AppState::new(config));
        let body = json!({
            "complete": true,
            "results": 5,
            "builder": {"name": "svc"},
            "properties": {"branch": ["main", "Build"]},
            "url": "http://x/1",
        });

        let Json(msg) = handle_build_event(AxumState(state.clone()), event(body)).await;
        assert_eq!(msg.text, ":white_check_mark: Finished svc at main : http://x/1\n");

        let Json(msg) =
            handle_build_event(AxumState(state), event(json!({"complete": true, "results": 0})))
                .await;
        assert_eq!(msg.text, ":x: Finished  at  : \n");
    }
}
