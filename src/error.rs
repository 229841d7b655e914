use std::io;

/// Custom error type for mattermost_buildbot operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Command parsing failed: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl BridgeError {
    /// The bare reason, without the category prefix of `Display`.
    pub fn reason(&self) -> String {
        match self {
            BridgeError::ConfigError(msg)
            | BridgeError::AuthError(msg)
            | BridgeError::ParseError(msg) => msg.clone(),
            BridgeError::IoError(e) => e.to_string(),
            BridgeError::TomlParseError(e) => e.to_string(),
        }
    }
}

/// Helper type for Results that use BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_category() {
        let err = BridgeError::AuthError("invalid token".to_string());
        assert_eq!(err.to_string(), "Authentication failed: invalid token");
        assert_eq!(err.reason(), "invalid token");
    }

    #[test]
    fn test_io_error_converts() {
        let err: BridgeError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, BridgeError::IoError(_)));
        assert_eq!(err.reason(), "gone");
    }
}
