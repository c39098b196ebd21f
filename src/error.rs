use thiserror::Error;

/// Main error type for dmode
#[derive(Debug, Error)]
pub enum DaemonError {
    // Setup errors
    #[error("Cannot resolve current executable: {0}")]
    ExecutableNotFound(#[source] std::io::Error),

    #[error("Cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build async runtime: {0}")]
    Runtime(String),

    // Signal errors
    #[error("Signal error: {0}")]
    Signal(String),

    // PID file errors
    #[error("PID file error: {0}")]
    PidFile(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dmode operations
pub type Result<T> = std::result::Result<T, DaemonError>;
