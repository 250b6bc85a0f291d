//! The backend query service abstraction.

use serde_json::Value;

use crate::error::ServiceError;

/// A stateless backend that authenticates credentials and executes read
/// statements.
///
/// The driver talks to the service exclusively through this trait so the
/// session layer can be exercised against in-process fakes. The one real
/// implementation is [`crate::HttpQueryService`].
pub trait QueryService: Send + Sync {
    /// Exchange credentials for a bearer token.
    fn authenticate(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<String, ServiceError>;

    /// Execute raw SQL against the named engine, returning the normalized
    /// row list.
    ///
    /// A 401 response maps to [`ServiceError::Unauthorized`] so the caller
    /// can distinguish an expired token from a failed query.
    fn execute(&self, sql: &str, engine: &str, token: &str) -> Result<Vec<Value>, ServiceError>;
}
