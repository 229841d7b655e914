use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::Result;

const DEFAULT_MAX_LOG_FILES: usize = 5;
const DEFAULT_LOG_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "bridge_logs";

pub struct FileLogger {
    log_directory: PathBuf,
    max_files: usize,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            max_files: DEFAULT_MAX_LOG_FILES,
            rotation: Rotation::DAILY,
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Creates the log directory and a non-blocking rolling writer into it.
    /// The guard must be held for as long as logs should be flushed.
    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(LOG_FILE_PREFIX)
            .max_log_files(self.max_files)
            .build(&self.log_directory)
            .map_err(|e| {
                crate::error::BridgeError::ConfigError(format!(
                    "Failed to create log file appender in {:?}: {}",
                    self.log_directory, e
                ))
            })?;

        Ok(tracing_appender::non_blocking(file_appender))
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber: console output, plus rolling file output
/// when a `FileLogger` is given. Returns the file writer's guard, if any.
pub fn setup_logging(file_logger: Option<&FileLogger>) -> Result<Option<WorkerGuard>> {
    match file_logger {
        Some(file_logger) => {
            let (file_writer, guard) = file_logger.setup_file_logging()?;
            tracing_subscriber::registry()
                .with(env_filter())
                .with(tracing_subscriber::fmt::layer()) // Console output
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file_writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(tracing_subscriber::fmt::layer())
                .init();
            Ok(None)
        }
    }
}
