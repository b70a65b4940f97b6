//! Error types for the AlternC API client.
//!
//! # Design
//! Configuration problems are caught once, when the client is built, and
//! land in `ConfigError`. Everything that can go wrong while talking to the
//! panel is funnelled into `ApiError`. Remote application errors (an error
//! code inside an otherwise valid JSON body) are not interpreted here; the
//! caller decides what an empty or falsy payload means for its request.

use thiserror::Error;

/// Invalid or missing configuration, raised by `ClientConfig::resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required key 'url' not supplied and environment variable '{0}' is not set")]
    MissingUrl(&'static str),

    #[error("required key 'secret' not supplied and environment variable '{0}' is not set")]
    MissingSecret(&'static str),

    /// Only raised for the `user` login method.
    #[error("key 'user' not supplied and environment variable '{0}' is not set while using login method 'user'")]
    MissingUser(&'static str),

    #[error("config key '{key}' with value '{value}' not in allowed values: {}", .allowed.join(", "))]
    InvalidOption {
        key: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },
}

/// A network-level failure reported by a `Transport`.
///
/// The core never inspects or retries these; they are handed back to the
/// caller as-is.
#[derive(Debug, Error)]
#[error("transport failed: {source}")]
pub struct TransportError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl TransportError {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            source: source.into(),
        }
    }
}

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body is not valid JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Why an authentication handshake did not yield a token.
///
/// `ensure_authenticated` collapses all of these into `false`;
/// `try_authenticate` hands them back for callers that want to know.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed authentication response: {0}")]
    MalformedResponse(String),

    /// The response decoded fine but carried no `token` field.
    #[error("authentication response did not contain a token")]
    MissingToken,
}
