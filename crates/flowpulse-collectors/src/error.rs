use thiserror::Error;

/// Errors returned while talking to an upstream source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream returned a non-2xx status.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The upstream answered 2xx but the payload was not usable.
    #[error("unusable response: {0}")]
    Payload(String),
}

/// Errors raised while constructing a collector.
///
/// A missing credential fails that one collector fast without touching the
/// others.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required credential is absent from the environment.
    #[error("missing API key: set {var}")]
    MissingApiKey { var: &'static str },

    /// The configured base URL does not parse.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The underlying `reqwest::Client` could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}
