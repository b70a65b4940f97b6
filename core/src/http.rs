//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and wraps `HttpResponse` values; the actual
//! round-trip happens behind the `Transport` trait, implemented by the
//! caller with whatever HTTP stack it already has. Sockets, TLS, redirects
//! and timeouts all live on that side of the boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RequestMethod;
use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl From<RequestMethod> for HttpMethod {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => HttpMethod::Get,
            RequestMethod::Post => HttpMethod::Post,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// A single parameter value. The panel only ever takes flat maps of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Query-string rendering. Booleans become `1` / `0`.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Flat key/value parameters. Ordered so built requests are deterministic.
pub type Params = BTreeMap<String, Scalar>;

/// Fixed API entry points, relative to the panel base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `api/rest`, followed by `{object}/{action}`.
    Rest,
    /// `api/post`, object and action folded into the parameters.
    Post,
    /// `api/auth/sharedsecret`
    SharedSecret,
    /// `api/auth/login`
    Login,
}

impl Endpoint {
    pub fn root(self) -> &'static str {
        match self {
            Endpoint::Rest => "api/rest",
            Endpoint::Post => "api/post",
            Endpoint::SharedSecret => "api/auth/sharedsecret",
            Endpoint::Login => "api/auth/login",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the part below the endpoint root (`account/find` for a REST
/// call, empty otherwise); `url` is the full target without query string.
/// The transport serializes `body`, when present, as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    pub path: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Params,
    pub body: Option<Params>,
}

impl HttpRequest {
    /// Merge caller headers in. Names already present (the defaults among
    /// them) keep their value; comparison ignores ASCII case.
    pub fn merge_headers<I, K, V>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in extra {
            let name = name.into();
            if !self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(&name)) {
                self.headers.push((name, value.into()));
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// JSON rendering of `body`, for transports that want a string.
    pub fn body_json(&self) -> Option<String> {
        self.body.as_ref().and_then(|body| serde_json::to_string(body).ok())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes one `HttpRequest`. Implementations must hand back non-2xx
/// responses as data; only network-level failures are errors.
pub trait Transport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
