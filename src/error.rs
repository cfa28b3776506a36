use thiserror::Error;

/// Main error type for the link watchdog
#[derive(Error, Debug)]
pub enum RelinkError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Link errors
    #[error("Link error: {0}")]
    Link(String),

    // CLI argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RelinkError
pub type Result<T> = std::result::Result<T, RelinkError>;
