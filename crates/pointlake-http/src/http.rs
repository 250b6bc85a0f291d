//! The concrete HTTP implementation of [`QueryService`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::ServiceError;
use crate::service::QueryService;
use crate::wire::{normalize_rows, AuthRequest, AuthResponse};

const AUTH_PATH: &str = "/api/authenticate";
const QUERY_PATH: &str = "/services/pointlake/api/v2/query";

/// Synchronous HTTP client for the Pointlake query service.
///
/// One instance corresponds to one connection's transport configuration
/// (endpoint, timeout, user agent, TLS verification). The client itself is
/// stateless: tokens are owned by the session layer and passed per call.
pub struct HttpQueryService {
    agent: ureq::Agent,
    endpoint_base: String,
}

impl std::fmt::Debug for HttpQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpQueryService")
            .field("endpoint_base", &self.endpoint_base)
            .finish_non_exhaustive()
    }
}

impl HttpQueryService {
    /// Build a client for the given endpoint.
    ///
    /// `verify_tls = false` disables certificate and hostname verification;
    /// it exists for self-signed staging deployments and should stay on
    /// everywhere else.
    pub fn new(
        endpoint_base: &str,
        user_agent: &str,
        timeout: Duration,
        verify_tls: bool,
    ) -> Result<Self, ServiceError> {
        if !verify_tls {
            tracing::warn!("TLS verification disabled for {endpoint_base}");
        }
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .danger_accept_invalid_hostnames(!verify_tls)
            .build()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .tls_connector(Arc::new(tls))
            .build();
        Ok(Self {
            agent,
            endpoint_base: endpoint_base.to_string(),
        })
    }

    /// Join `path` onto the endpoint base, tolerating stray slashes on
    /// either side.
    fn url(&self, path: &str) -> String {
        let base = self.endpoint_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl QueryService for HttpQueryService {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<String, ServiceError> {
        let url = self.url(AUTH_PATH);
        tracing::debug!(%url, username, "authenticating");

        let body = serde_json::to_string(&AuthRequest {
            username,
            password,
            remember_me,
        })
        .map_err(|err| ServiceError::Malformed(err.to_string()))?;

        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                tracing::debug!(status, "authentication rejected");
                return Err(ServiceError::AuthRejected(format!("status {status}: {body}")));
            }
            Err(err) => return Err(ServiceError::Transport(err.to_string())),
        };

        let text = response
            .into_string()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let parsed: AuthResponse = serde_json::from_str(&text)
            .map_err(|_| ServiceError::Malformed("authentication response missing id_token".into()))?;
        tracing::debug!("authentication succeeded, token obtained");
        Ok(parsed.id_token)
    }

    fn execute(&self, sql: &str, engine: &str, token: &str) -> Result<Vec<Value>, ServiceError> {
        let url = format!("{}?sqlEngine={engine}", self.url(QUERY_PATH));
        let sql_prefix: String = sql.chars().take(100).collect();
        tracing::debug!(engine, %sql_prefix, "executing query");

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {token}"))
            .set("Content-Type", "text/plain")
            .send_string(sql);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(401, _)) => {
                tracing::debug!("query returned 401, token may be expired");
                return Err(ServiceError::Unauthorized);
            }
            Err(ureq::Error::Status(status, response)) => {
                return Err(ServiceError::Status {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(err) => return Err(ServiceError::Transport(err.to_string())),
        };

        let text = response
            .into_string()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let payload: Value = serde_json::from_str(&text)
            .map_err(|err| ServiceError::Malformed(err.to_string()))?;
        Ok(normalize_rows(payload))
    }
}
