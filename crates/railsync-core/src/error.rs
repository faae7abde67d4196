//! Error types for the railsync core library
//!
//! One error enum covers the full taxonomy of a remote operation: local
//! precondition violations, transport failures, remote status/validation
//! failures, and local mapping failures. No kind is ever retried by the core.

use std::collections::HashMap;
use thiserror::Error;

/// Main error type for remote operations
#[derive(Error, Debug)]
pub enum Error {
    /// An instance-scoped operation was called on an object with no remote ID.
    ///
    /// Raised before any network activity. This indicates a caller usage
    /// mistake rather than an environment failure.
    #[error("operation requires a remote ID, but none is set")]
    NullRemoteId,

    /// The transport collaborator could not complete the exchange
    /// (connectivity, timeout). Surfaced as-is, never interpreted.
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A non-2xx HTTP status without a structured validation payload.
    #[error("remote returned status {status}")]
    RemoteStatus { status: u16, body: String },

    /// A 422-class response carrying per-field validation failures.
    ///
    /// The mapping from remote field name to reason strings is exposed
    /// intact so callers can iterate per-field reasons.
    #[error("remote validation failed for {} field(s)", errors.len())]
    RemoteValidation {
        errors: HashMap<String, Vec<String>>,
    },

    /// A response body could not be interpreted as the expected shape
    /// (e.g. expected an object, found a scalar).
    #[error("response mapping failed: {message}")]
    LocalMapping { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors (bad base URL, missing type registration, ...)
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
