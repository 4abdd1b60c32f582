//! Error types for voxline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxlineError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Device errors
    #[error("Audio device unavailable or access denied: {message}")]
    DeviceAccess { message: String },

    // Transport errors
    #[error("Live session connection failed: {message}")]
    Connection { message: String },

    // Inbound payload errors. Non-fatal: the offending chunk is dropped
    // and the session continues.
    #[error("Malformed audio payload: {message}")]
    Decode { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxlineError>;
