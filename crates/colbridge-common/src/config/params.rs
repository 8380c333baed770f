//! Normalized connection parameters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known parameter keys, in normalized (lowercase) form.
pub mod keys {
    /// Original connection URL, kept for diagnostics.
    pub const URL: &str = "url";
    /// Contact points, separated by `--`.
    pub const HOST: &str = "host";
    /// Native protocol port.
    pub const PORT: &str = "port";
    /// Keyspace the session is bound to.
    pub const KEYSPACE: &str = "keyspace";
    /// Username for authentication.
    pub const USER: &str = "user";
    /// Password for authentication.
    pub const PASSWORD: &str = "password";
    /// Debug mode: policy parse failures become connection failures.
    pub const DEBUG: &str = "debug";
    /// Enables TLS.
    pub const SSL_ENABLED: &str = "enablessl";
    /// Verifies the server certificate when TLS is enabled.
    pub const VERIFY_SERVER_CERTIFICATE: &str = "verifyservercertificate";
    /// Load balancing policy text.
    pub const LOAD_BALANCING_POLICY: &str = "loadbalancing";
    /// Retry policy text.
    pub const RETRY_POLICY: &str = "retry";
    /// Reconnection policy text.
    pub const RECONNECT_POLICY: &str = "reconnection";
}

/// An already-parsed, normalized set of connection parameters.
///
/// Keys are trimmed and lowercased; entries are kept sorted, so two
/// parameter sets that differ only in key case or insertion order compare
/// and hash equal. This is the key of the shared session cache.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionParams {
    entries: BTreeMap<String, String>,
}

impl ConnectionParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, returning the updated set.
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a parameter. Later values for the same key win.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = normalize_key(key.as_ref());
        if key.is_empty() {
            return;
        }
        self.entries.insert(key, value.into());
    }

    /// Merges `overrides` into this set; their values take priority.
    #[must_use]
    pub fn merged(mut self, overrides: &ConnectionParams) -> Self {
        for (key, value) in &overrides.entries {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    /// Returns the value for `key`, looked up case-insensitively.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize_key(key)).map(String::as_str)
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the normalized entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a short label for log lines: the URL if present, otherwise
    /// `host:port/keyspace`.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(url) = self.get(keys::URL) {
            return url.to_string();
        }
        format!(
            "{}:{}/{}",
            self.get(keys::HOST).unwrap_or("?"),
            self.get(keys::PORT).unwrap_or("-"),
            self.get(keys::KEYSPACE).unwrap_or("")
        )
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ConnectionParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if key == keys::PASSWORD {
                map.entry(key, &"***");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(params: &ConnectionParams) -> u64 {
        let mut hasher = DefaultHasher::new();
        params.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_key_normalization() {
        let a = ConnectionParams::new()
            .with(" Host ", "localhost")
            .with("KEYSPACE", "ks");
        let b = ConnectionParams::new()
            .with("keyspace", "ks")
            .with("host", "localhost");

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.get("HoSt"), Some("localhost"));
    }

    #[test]
    fn test_values_are_not_normalized() {
        let a = ConnectionParams::new().with("keyspace", "KS");
        let b = ConnectionParams::new().with("keyspace", "ks");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_key_dropped() {
        let params = ConnectionParams::new().with("   ", "x");
        assert!(params.is_empty());
    }

    #[test]
    fn test_merged_overrides_win() {
        let base = ConnectionParams::new().with("port", "9042").with("host", "a");
        let overrides = ConnectionParams::new().with("PORT", "9142");
        let merged = base.merged(&overrides);
        assert_eq!(merged.get("port"), Some("9142"));
        assert_eq!(merged.get("host"), Some("a"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_debug_redacts_password() {
        let params = ConnectionParams::new()
            .with("user", "cassandra")
            .with("password", "secret");
        let rendered = format!("{:?}", params);
        assert!(rendered.contains("cassandra"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_label() {
        let params: ConnectionParams = [("host", "h1"), ("port", "9042"), ("keyspace", "ks")]
            .into_iter()
            .collect();
        assert_eq!(params.label(), "h1:9042/ks");

        let params = params.with("url", "jdbc:cassandra://h1:9042/ks");
        assert_eq!(params.label(), "jdbc:cassandra://h1:9042/ks");
    }
}
