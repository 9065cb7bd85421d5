//! Session error types.

use crate::environment::EnvironmentError;
use crate::generator::GenerateError;
use thiserror::Error;

/// Why a provisioning session failed.
///
/// Each variant names the stage that failed; the source carries the cause.
/// Errors from compensating actions never appear here, they are logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Rejected before any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to generate istio configuration")]
    Generate(#[source] GenerateError),

    #[error("failed to generate {environment} environment configuration")]
    EnvConfig {
        environment: &'static str,
        #[source]
        source: EnvironmentError,
    },

    #[error("failed to apply configuration to {environment} environment")]
    Apply {
        environment: &'static str,
        #[source]
        source: EnvironmentError,
    },

    #[error("failed to revert configuration from {environment} environment")]
    Revert {
        environment: &'static str,
        #[source]
        source: EnvironmentError,
    },

    /// Waiting for the operator failed; nothing was reverted yet.
    #[error("unable to wait for termination signal")]
    Termination(#[source] std::io::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
