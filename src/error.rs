use thiserror::Error;

use crate::lock::LockError;
use crate::model::ModelError;

/// Error returned by catalog and roster operations.
///
/// Every variant except `Internal` is detected locally and carries the
/// message shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// The referenced parent or user does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The operation contradicts the current membership state.
    #[error("{0}")]
    Conflict(String),
    /// The roster is full.
    #[error("{0}")]
    Capacity(String),
    /// Storage or lock failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HubError::Validation(_) => 400,
            HubError::NotFound(_) => 404,
            HubError::Conflict(_) => 400,
            HubError::Capacity(_) => 400,
            HubError::Internal(_) => 500,
        }
    }
}

impl From<ModelError> for HubError {
    fn from(err: ModelError) -> Self {
        HubError::Internal(err.to_string())
    }
}

impl From<LockError> for HubError {
    fn from(err: LockError) -> Self {
        HubError::Internal(err.to_string())
    }
}
