//! Synchronous client core for the AlternC server-administration panel API.
//!
//! # Overview
//! Builds `HttpRequest` values and decodes `HttpResponse` values; the HTTP
//! round-trip itself is delegated to a caller-supplied `Transport`
//! (host-does-IO pattern).
//!
//! # Design
//! - `ClientConfig::resolve` merges explicit settings with an environment
//!   snapshot and validates them once, at construction.
//! - The panel speaks two dialects (REST paths or a single POST endpoint)
//!   and accepts two login methods (shared secret or user/password); both
//!   choices are configuration, not separate code paths for callers.
//! - `AlterncClient::ensure_authenticated` performs the login handshake at
//!   most once per token.
//! - Responses are exposed undecorated; callers choose the shape they
//!   expect (`auth()` or `content()`).
//!
//! Logging goes through the `log` facade. Secrets and tokens are never
//! logged.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod session;

pub use client::AlterncClient;
pub use config::{ApiStyle, ClientConfig, LoginMethod, PartialConfig, RequestMethod};
pub use error::{ApiError, AuthFailure, ConfigError, TransportError};
pub use http::{Endpoint, HttpMethod, HttpRequest, HttpResponse, Params, Scalar, Transport};
pub use request::LogicalRequest;
pub use response::{AuthResponse, ContentResponse, ResponseEnvelope};
pub use session::Session;
