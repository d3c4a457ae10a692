//! Move oracle error types.

use thiserror::Error;

/// Errors talking to the move oracle
#[derive(Debug, Error)]
pub enum OracleError {
    /// Connection failure, DNS failure or timeout
    #[error("Failed to connect to move oracle: {0}")]
    Unreachable(String),

    /// The oracle answered with a non-2xx status
    #[error("Move oracle error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The HTTP client could not be built
    #[error("Move oracle client configuration error: {0}")]
    Configuration(String),

    /// The oracle answered 2xx with a body we cannot use
    #[error("Invalid move oracle response: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Unreachable(_) => "unreachable",
            OracleError::Upstream { .. } => "upstream",
            OracleError::Configuration(_) => "configuration",
            OracleError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Result type for oracle calls
pub type OracleResult<T> = Result<T, OracleError>;
