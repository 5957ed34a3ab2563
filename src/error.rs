use thiserror::Error;

/// Failure taxonomy for calls against the hosted backend.
///
/// Only `Rejected` carries collaborator text that callers of
/// sign-in/sign-up see verbatim; every other kind is absorbed by the auth
/// service and reflected as degraded state.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend refused the request (bad credentials, policy rejection).
    #[error("{0}")]
    Rejected(String),
    /// The requested record does not exist.
    #[error("record not found")]
    NotFound,
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}
