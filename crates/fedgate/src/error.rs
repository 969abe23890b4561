//! Gateway error taxonomy

use fedgate_core::BackendError;
use thiserror::Error;

/// Result type for gateway calls
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The registry could not produce a backend for the scope
    #[error("Failed to resolve scope '{scope}': {source}")]
    Resolution {
        scope: String,
        #[source]
        source: BackendError,
    },

    /// The registry could not enumerate its backends
    #[error("Failed to list backends: {0}")]
    Listing(#[source] BackendError),

    /// A backend operation failed; carried verbatim
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The caller cancelled the call. Not a failure.
    #[error("Cancelled")]
    Cancelled,

    /// Invalid gateway configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether the call ended because the caller cancelled it
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }

    /// The backend error behind this failure, if any
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            GatewayError::Resolution { source, .. } => Some(source),
            GatewayError::Listing(source) => Some(source),
            GatewayError::Backend(source) => Some(source),
            GatewayError::Cancelled | GatewayError::Config(_) => None,
        }
    }
}
