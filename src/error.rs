//! Error types for portfix

use std::path::PathBuf;
use thiserror::Error;

/// Result type for portfix operations
pub type Result<T> = std::result::Result<T, PortfixError>;

/// portfix error types
#[derive(Error, Debug)]
pub enum PortfixError {
    #[error("Compose file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
