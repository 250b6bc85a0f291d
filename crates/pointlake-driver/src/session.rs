//! Per-connection session state machine.
//!
//! A session owns the merged configuration, the backend service handle, and
//! the authentication token. State transitions:
//!
//! ```text
//! Disconnected -> Authenticating (connect() dispatches credentials)
//! Authenticating -> Connected    (token obtained)
//! Authenticating -> Disconnected (authentication rejected)
//! Connected -> Disconnected      (disconnect(), or re-authentication
//!                                 failure during execute())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use pointlake_http::{HttpQueryService, QueryService, ServiceError};

use crate::config::ConnectionConfig;
use crate::error::{DriverError, Result};
use crate::guard;

/// Runtime connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No usable token; only `connect` is meaningful.
    #[default]
    Disconnected,
    /// Credentials are in flight.
    Authenticating,
    /// A token is held and queries may be executed.
    Connected,
}

/// Builds a [`QueryService`] for a connection's configuration.
///
/// The driver installs an HTTP factory by default; tests substitute
/// in-process fakes so the session and pipeline logic can be exercised
/// without a network.
pub trait ServiceFactory: Send + Sync {
    /// Create the service a session will talk to.
    fn create(&self, config: &ConnectionConfig) -> Result<Arc<dyn QueryService>>;
}

/// The production factory: one [`HttpQueryService`] per connection.
#[derive(Debug, Default)]
pub struct HttpServiceFactory;

impl ServiceFactory for HttpServiceFactory {
    fn create(&self, config: &ConnectionConfig) -> Result<Arc<dyn QueryService>> {
        let service = HttpQueryService::new(
            &config.endpoint_base,
            &config.user_agent,
            config.timeout,
            config.verify_tls,
        )
        .map_err(|err| DriverError::Config(err.to_string()))?;
        Ok(Arc::new(service))
    }
}

/// One connection's authentication and execution state.
pub struct ConnectionSession {
    config: ConnectionConfig,
    service: Option<Arc<dyn QueryService>>,
    token: Option<String>,
    token_obtained_at: Option<Instant>,
    token_valid: bool,
    state: SessionState,
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("state", &self.state)
            .field("token_valid", &self.token_valid)
            .finish_non_exhaustive()
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSession {
    /// A fresh, disconnected session with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ConnectionConfig::default(),
            service: None,
            token: None,
            token_obtained_at: None,
            token_valid: false,
            state: SessionState::Disconnected,
        }
    }

    /// The session's current configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Current state-machine position.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connected means a non-empty token *and* the validity flag; both are
    /// required.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.token_valid && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Age of the current token, for expiry diagnosis.
    #[must_use]
    pub fn token_age(&self) -> Option<Duration> {
        self.token_obtained_at.map(|at| at.elapsed())
    }

    /// Store the configuration and authenticate against `service`.
    ///
    /// On success the session holds the returned token and is `Connected`;
    /// on rejection it returns to `Disconnected` with no token.
    pub fn connect(
        &mut self,
        config: ConnectionConfig,
        service: Arc<dyn QueryService>,
    ) -> Result<()> {
        self.config = config;
        self.service = Some(Arc::clone(&service));
        self.state = SessionState::Authenticating;

        match service.authenticate(
            &self.config.username,
            &self.config.password,
            self.config.remember_me,
        ) {
            Ok(token) => {
                self.store_token(token);
                self.state = SessionState::Connected;
                tracing::debug!("session connected");
                Ok(())
            }
            Err(err) => {
                self.drop_token();
                self.state = SessionState::Disconnected;
                Err(DriverError::AuthenticationFailed(err.to_string()))
            }
        }
    }

    /// Execute a read statement, returning the backend's row list.
    ///
    /// Statement gating happens here, before anything touches the network.
    /// An unauthorized response triggers exactly one re-authentication with
    /// the stored credentials and, if that succeeds, exactly one retry of
    /// the original query; the retry's outcome is final.
    pub fn execute(&mut self, sql: &str) -> Result<Vec<Value>> {
        if !self.is_connected() {
            return Err(DriverError::NotConnected);
        }
        if !guard::is_read_only(sql) {
            return Err(DriverError::StatementNotAllowed);
        }
        let service = self
            .service
            .clone()
            .ok_or(DriverError::NotConnected)?;
        let token = self.token.clone().ok_or(DriverError::NotConnected)?;

        match service.execute(sql, &self.config.sql_engine, &token) {
            Ok(rows) => Ok(rows),
            Err(ServiceError::Unauthorized) => {
                tracing::debug!("token rejected, re-authenticating once");
                match service.authenticate(
                    &self.config.username,
                    &self.config.password,
                    self.config.remember_me,
                ) {
                    Ok(fresh) => {
                        self.store_token(fresh.clone());
                        service
                            .execute(sql, &self.config.sql_engine, &fresh)
                            .map_err(|err| DriverError::ExecutionFailed(err.to_string()))
                    }
                    Err(err) => {
                        tracing::warn!("re-authentication failed, dropping session");
                        self.drop_token();
                        self.state = SessionState::Disconnected;
                        Err(DriverError::AuthenticationFailed(err.to_string()))
                    }
                }
            }
            Err(err) => Err(DriverError::ExecutionFailed(err.to_string())),
        }
    }

    /// Clear the token and return to `Disconnected`. Idempotent.
    pub fn disconnect(&mut self) {
        self.drop_token();
        self.state = SessionState::Disconnected;
    }

    fn store_token(&mut self, token: String) {
        self.token = Some(token);
        self.token_obtained_at = Some(Instant::now());
        self.token_valid = true;
    }

    fn drop_token(&mut self) {
        self.token = None;
        self.token_obtained_at = None;
        self.token_valid = false;
    }
}
