use mattermost_buildbot::api::router;
use mattermost_buildbot::logging::{FileLogger, setup_logging};
use mattermost_buildbot::{AppState, load_config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8010";
const DEFAULT_CONFIG_PATH: &str = "bridge_config.toml";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let config_path =
        std::env::var("BRIDGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let file_logger = std::env::var("LOG_DIR")
        .ok()
        .map(|dir| FileLogger::new(PathBuf::from(dir)));

    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging setup error: {}", e);
            std::process::exit(1);
        }
    };

    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if config.intake.is_none() {
        warn!("No [intake] table in {:?}; every /build command will be refused", config_path);
    }

    let state = Arc::new(AppState::new(config));

    let app = router(state);

    info!("Listening on {}", bind_address);
    info!("Using config at {:?}", config_path);
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
