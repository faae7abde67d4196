//! Remote configuration
//!
//! A `RemoteConfig` supplies the base URL, optional basic-auth credentials,
//! and the behavior toggles that govern naming and encoding conventions.
//! A context holds one default config; a model type may carry its own, which
//! fully replaces the default for that type (never a merge).

use serde::{Deserialize, Serialize};

/// Date format Rails emits by default (ISO 8601, UTC, second precision).
pub const RAILS_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Suffix Rails expects on nested-attribute keys.
pub const ATTRIBUTES_SUFFIX: &str = "_attributes";

/// Configuration for talking to one remote server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the server, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Basic-auth username, if the server requires it
    pub username: Option<String>,
    /// Basic-auth password
    pub password: Option<String>,
    /// Derive remote keys by underscoring camel-cased local names
    /// (and camelize on the way back). Off means identity transform.
    pub auto_inflect: bool,
    /// Lower-case the fully assembled request path before use.
    /// Applied after pluralization and name resolution, never before.
    pub lowercase_urls: bool,
    /// Encode nested collections as `{"0": {...}, "1": {...}}` indexed maps
    /// instead of arrays, for servers that expect indexed-hash
    /// nested-attribute payloads.
    pub has_many_as_hash: bool,
    /// Suffix appended to association keys sent as nested attributes.
    pub attributes_suffix: String,
    /// `chrono` format string for date-valued fields on the wire.
    pub date_format: String,
    /// Request timeout in seconds for the default transport.
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Create a config for a base URL with default conventions.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Attach basic-auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: None,
            password: None,
            auto_inflect: true,
            lowercase_urls: true,
            has_many_as_hash: false,
            attributes_suffix: ATTRIBUTES_SUFFIX.to_string(),
            date_format: RAILS_DATE_FORMAT.to_string(),
            timeout_secs: 30,
        }
    }
}
