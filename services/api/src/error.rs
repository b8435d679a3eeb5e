//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the mapping
//! from core port errors to HTTP responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use study_planner_core::ports::PortError;
use tracing::{error, warn};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The error half of every handler's return type.
pub type HandlerError = (StatusCode, String);

/// Logs a failed port call and turns it into a response. Validation and lookup
/// failures keep their message; anything else is reported as "did not take effect".
pub fn port_failure(action: &str, e: PortError) -> HandlerError {
    match e {
        PortError::Invalid(message) => {
            warn!("Rejected {}: {}", action, message);
            (StatusCode::BAD_REQUEST, message)
        }
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Unexpected(message) => {
            error!("Failed to {}: {}", action, message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_statuses() {
        assert_eq!(
            port_failure("save", PortError::Invalid("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            port_failure("load", PortError::NotFound("gone".into())).0,
            StatusCode::NOT_FOUND
        );
        let (status, body) = port_failure("save entry", PortError::Unexpected("db down".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to save entry");
    }
}
