//! Backend service error types.

use thiserror::Error;

/// Errors surfaced by the backend query service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The authentication endpoint rejected the credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// The service returned 401 for a query; the token is missing, expired,
    /// or revoked. The session layer may re-authenticate once and retry.
    #[error("request unauthorized")]
    Unauthorized,

    /// The service returned a non-success status other than 401.
    #[error("server returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Whether this error is the unauthorized signal that permits a single
    /// re-authentication attempt.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
