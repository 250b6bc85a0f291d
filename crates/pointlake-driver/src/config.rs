//! Connection configuration: defaults, connection strings, and DSN lookup.
//!
//! Precedence is three-level: explicit connection parameters override a
//! persisted DSN entry, which overrides the built-in defaults.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Built-in default endpoint.
pub const DEFAULT_ENDPOINT_BASE: &str = "https://api.withleaf.io";
/// Built-in default SQL engine selector.
pub const DEFAULT_SQL_ENGINE: &str = "SPARK_SQL";
/// Built-in default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Built-in default user-agent string.
pub const DEFAULT_USER_AGENT: &str = concat!("pointlake-driver/", env!("CARGO_PKG_VERSION"));

/// Merged configuration for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL of the query service.
    pub endpoint_base: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Ask the service for a long-lived token.
    pub remember_me: bool,
    /// SQL engine selector passed with every query.
    pub sql_engine: String,
    /// Request timeout for both authentication and queries.
    pub timeout: Duration,
    /// Whether to verify the server's TLS certificate.
    pub verify_tls: bool,
    /// User-agent string sent with every request.
    pub user_agent: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint_base: DEFAULT_ENDPOINT_BASE.to_string(),
            username: String::new(),
            password: String::new(),
            remember_me: true,
            sql_engine: DEFAULT_SQL_ENGINE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            verify_tls: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration with the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the account credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the endpoint base URL.
    #[must_use]
    pub fn endpoint(mut self, endpoint_base: impl Into<String>) -> Self {
        self.endpoint_base = endpoint_base.into();
        self
    }

    /// Set the SQL engine selector.
    #[must_use]
    pub fn engine(mut self, sql_engine: impl Into<String>) -> Self {
        self.sql_engine = sql_engine.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse a `Key=Value;` connection string on top of the defaults.
    ///
    /// Keys are case-insensitive and several aliases are accepted
    /// (`uid`/`user`/`username`, `pwd`/`password`, ...). Values may be
    /// double-quoted to include `;` or `=`.
    #[must_use]
    pub fn from_connection_string(connection_string: &str) -> Self {
        let mut config = Self::default();
        for (key, value) in parse_pairs(connection_string) {
            config.apply_option(&key, &value);
        }
        config
    }

    /// Merge a DSN-derived configuration with explicit overrides.
    ///
    /// An override field wins when it differs from the built-in default;
    /// untouched fields keep the DSN value.
    #[must_use]
    pub fn merge(dsn: Self, overrides: Self) -> Self {
        let defaults = Self::default();
        let mut merged = dsn;
        if !overrides.endpoint_base.is_empty() && overrides.endpoint_base != defaults.endpoint_base
        {
            merged.endpoint_base = overrides.endpoint_base;
        }
        if !overrides.username.is_empty() {
            merged.username = overrides.username;
        }
        if !overrides.password.is_empty() {
            merged.password = overrides.password;
        }
        if overrides.remember_me != defaults.remember_me {
            merged.remember_me = overrides.remember_me;
        }
        if !overrides.sql_engine.is_empty() && overrides.sql_engine != defaults.sql_engine {
            merged.sql_engine = overrides.sql_engine;
        }
        if overrides.timeout != defaults.timeout && overrides.timeout > Duration::ZERO {
            merged.timeout = overrides.timeout;
        }
        if overrides.verify_tls != defaults.verify_tls {
            merged.verify_tls = overrides.verify_tls;
        }
        if !overrides.user_agent.is_empty() && overrides.user_agent != defaults.user_agent {
            merged.user_agent = overrides.user_agent;
        }
        merged
    }

    fn apply_option(&mut self, key: &str, value: &str) {
        match key {
            "endpointbase" | "endpoint_base" => self.endpoint_base = value.to_string(),
            "username" | "uid" | "user" => self.username = value.to_string(),
            "password" | "pwd" => self.password = value.to_string(),
            "rememberme" | "remember_me" => self.remember_me = parse_bool(value),
            "sqlengine" | "sql_engine" => self.sql_engine = value.to_string(),
            "timeoutsec" | "timeout_sec" | "timeout" => {
                let seconds = value.trim().parse::<i64>().unwrap_or(0);
                self.timeout = if seconds > 0 {
                    Duration::from_secs(seconds as u64)
                } else {
                    DEFAULT_TIMEOUT
                };
            }
            "verifytls" | "verify_tls" | "sslverify" => self.verify_tls = parse_bool(value),
            "useragent" | "user_agent" => self.user_agent = value.to_string(),
            _ => {}
        }
    }
}

/// Boolean option literals: `true`, `1`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Split a connection string into lowercased key / value pairs.
///
/// Pairs are separated by `;`; a value may be wrapped in double quotes to
/// carry separators, with `\"` escaping an embedded quote.
#[must_use]
pub fn parse_pairs(connection_string: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_key = true;
    let mut in_quoted = false;
    let mut prev = '\0';

    for c in connection_string.chars() {
        if in_quoted {
            if c == '"' && prev != '\\' {
                in_quoted = false;
                in_key = true;
                pairs.push((key.to_lowercase(), std::mem::take(&mut value)));
                key.clear();
            } else {
                value.push(c);
            }
        } else if c == '=' && in_key && !key.is_empty() {
            in_key = false;
        } else if c == ';' {
            if !key.is_empty() {
                pairs.push((key.to_lowercase(), value.trim().to_string()));
                key.clear();
                value.clear();
            }
            in_key = true;
        } else if c == '"' && !in_key {
            in_quoted = true;
        } else if in_key {
            key.push(c);
        } else {
            value.push(c);
        }
        prev = c;
    }
    if !key.is_empty() {
        pairs.push((key.to_lowercase(), value.trim().to_string()));
    }
    pairs
}

/// The DSN name named by a connection string, if any.
#[must_use]
pub fn dsn_name(connection_string: &str) -> Option<String> {
    parse_pairs(connection_string)
        .into_iter()
        .find(|(key, _)| key == "dsn")
        .map(|(_, value)| value)
}

/// Default search paths for the persisted DSN store.
#[must_use]
pub fn dsn_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".pointlake.ini"));
    }
    paths.push(PathBuf::from("/etc/pointlake.ini"));
    paths.push(PathBuf::from("/usr/local/etc/pointlake.ini"));
    paths
}

/// Resolve a DSN name from the default store locations.
///
/// A missing store or unknown section yields the built-in defaults.
#[must_use]
pub fn resolve_dsn(name: &str) -> ConnectionConfig {
    resolve_dsn_from(&dsn_search_paths(), name)
}

/// Resolve a DSN name from an explicit list of INI files; the first file
/// that can be read wins.
#[must_use]
pub fn resolve_dsn_from(paths: &[PathBuf], name: &str) -> ConnectionConfig {
    let mut config = ConnectionConfig::default();

    let Some(contents) = paths.iter().find_map(|path| {
        let contents = fs::read_to_string(path).ok()?;
        tracing::debug!(path = %path.display(), "reading DSN store");
        Some(contents)
    }) else {
        tracing::debug!("no DSN store found");
        return config;
    };

    let mut in_section = false;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = section.trim() == name;
            continue;
        }
        if in_section {
            if let Some((key, value)) = line.split_once('=') {
                config.apply_option(&key.trim().to_lowercase(), value.trim());
            }
        }
    }
    config
}
