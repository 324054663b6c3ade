//! Errors raised by the aggregation engine.

use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    /// Rejected before any upstream call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The hierarchy API answered with a non-success status.
    #[error("API error on {path}: {status} {message}")]
    Api {
        path: String,
        status: u16,
        message: String,
    },

    /// Transport failure or an unreadable response body.
    #[error("Failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AccessError {
    pub fn fetch(path: &str, source: impl Into<anyhow::Error>) -> Self {
        AccessError::Fetch {
            path: path.to_string(),
            source: source.into(),
        }
    }

    /// Upstream status code, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AccessError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InvalidInput(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            AccessError::Api {
                path,
                status,
                message,
            } => match status {
                401 => AppError::Unauthorized(anyhow::anyhow!(
                    "Credential rejected by upstream on {}",
                    path
                )),
                403 => AppError::Forbidden(anyhow::anyhow!(
                    "Credential cannot read {}",
                    path
                )),
                404 => AppError::NotFound(anyhow::anyhow!("{} not found upstream", path)),
                _ => AppError::Upstream { status, message },
            },
            err @ AccessError::Fetch { .. } => AppError::BadGateway(err.to_string()),
        }
    }
}
