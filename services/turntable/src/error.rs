//! services/turntable/src/error.rs
//!
//! Defines the primary error type for the turntable service.

use crate::config::ConfigError;
use crate::tools::MigrationError;
use turntable_core::ports::PortError;

/// The primary error type for the `turntable` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., writing a backup file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents a JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a migration that stopped before copying anything.
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
