//! Session configuration derived from connection parameters.

use serde::{Deserialize, Serialize};

use super::params::{keys, ConnectionParams};
use crate::constants::{DEFAULT_PORT, HOST_SEPARATOR};
use crate::error::{ConfigError, ConfigResult};

/// Configuration used to build one shared cluster session.
///
/// # Example
///
/// ```rust
/// use colbridge_common::config::SessionConfig;
///
/// let config = SessionConfig::new()
///     .host("127.0.0.1")
///     .port(9142)
///     .keyspace("system");
/// assert!(config.validate().is_ok());
/// assert_eq!(config.contact_points(), vec!["127.0.0.1:9142".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Contact points.
    pub hosts: Vec<String>,
    /// Native protocol port.
    pub port: u16,
    /// Keyspace the session is bound to.
    pub keyspace: Option<String>,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Debug mode: policy parse failures surface as connection failures
    /// instead of being logged and skipped.
    pub debug: bool,
    /// Whether TLS is enabled.
    pub ssl_enabled: bool,
    /// Whether the server certificate is verified.
    pub verify_server_certificate: bool,
    /// Load balancing policy, unparsed.
    pub load_balancing_policy: Option<String>,
    /// Retry policy, unparsed.
    pub retry_policy: Option<String>,
    /// Reconnection policy, unparsed.
    pub reconnect_policy: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost".to_string()],
            port: DEFAULT_PORT,
            keyspace: None,
            username: None,
            password: None,
            debug: false,
            ssl_enabled: false,
            verify_server_certificate: false,
            load_balancing_policy: None,
            retry_policy: None,
            reconnect_policy: None,
        }
    }
}

impl SessionConfig {
    /// Creates a new session configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from normalized connection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the host is missing or a value is malformed.
    pub fn from_params(params: &ConnectionParams) -> ConfigResult<Self> {
        let host = params.get(keys::HOST).ok_or_else(|| ConfigError::Missing {
            key: keys::HOST.to_string(),
        })?;
        let hosts: Vec<String> = host
            .split(HOST_SEPARATOR)
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(ToString::to_string)
            .collect();

        let port = match params.get(keys::PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(keys::PORT, raw, e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            hosts,
            port,
            keyspace: non_empty(params.get(keys::KEYSPACE)),
            username: non_empty(params.get(keys::USER)),
            password: params.get(keys::PASSWORD).map(ToString::to_string),
            debug: params.get(keys::DEBUG).is_some_and(is_truthy),
            ssl_enabled: params.get(keys::SSL_ENABLED).is_some_and(is_truthy),
            verify_server_certificate: params
                .get(keys::VERIFY_SERVER_CERTIFICATE)
                .is_some_and(is_truthy),
            load_balancing_policy: non_empty(params.get(keys::LOAD_BALANCING_POLICY)),
            retry_policy: non_empty(params.get(keys::RETRY_POLICY)),
            reconnect_policy: non_empty(params.get(keys::RECONNECT_POLICY)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets a single contact point.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts = vec![host.into()];
        self
    }

    /// Adds a contact point.
    #[must_use]
    pub fn add_host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the keyspace.
    #[must_use]
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enables TLS.
    #[must_use]
    pub fn ssl(mut self, enabled: bool, verify_server_certificate: bool) -> Self {
        self.ssl_enabled = enabled;
        self.verify_server_certificate = verify_server_certificate;
        self
    }

    /// Enables debug mode.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns true if credentials should be sent.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Returns `host:port` for every contact point.
    #[must_use]
    pub fn contact_points(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|h| format!("{}:{}", h, self.port))
            .collect()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if there is no contact point or the
    /// port is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hosts.is_empty() {
            return Err(ConfigError::invalid(
                keys::HOST,
                "",
                "at least one contact point is required",
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid(keys::PORT, "0", "port must be non-zero"));
        }
        Ok(())
    }
}

/// Returns true for `1` or `true` (case-insensitive).
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
