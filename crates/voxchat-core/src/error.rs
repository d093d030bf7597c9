use thiserror::Error;

/// Top-level error type for the Voxchat system.
///
/// Subsystem crates define their own error types; this one covers the
/// concerns shared by every crate (configuration, I/O, serialization) and
/// the server lifecycle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoxchatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("API error: {0}")]
    Api(String),
}

impl From<toml::de::Error> for VoxchatError {
    fn from(err: toml::de::Error) -> Self {
        VoxchatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VoxchatError {
    fn from(err: toml::ser::Error) -> Self {
        VoxchatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VoxchatError {
    fn from(err: serde_json::Error) -> Self {
        VoxchatError::Serialization(err.to_string())
    }
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, VoxchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoxchatError::Config("bad threshold".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad threshold");

        let err = VoxchatError::Api("bind failed".to_string());
        assert_eq!(err.to_string(), "API error: bind failed");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VoxchatError = io.into();
        assert!(matches!(err, VoxchatError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_from_toml_error() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("[chat\nbroken");
        let err: VoxchatError = parsed.unwrap_err().into();
        assert!(matches!(err, VoxchatError::Config(_)));
    }

    #[test]
    fn test_from_json_error() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let err: VoxchatError = parsed.unwrap_err().into();
        assert!(matches!(err, VoxchatError::Serialization(_)));
    }
}
