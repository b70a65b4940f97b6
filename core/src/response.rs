//! Response decoding.
//!
//! # Design
//! The panel always answers in JSON but not always in the same shape: most
//! endpoints nest the answer under `content`, the auth endpoints return a
//! flat object with a `token`. `ResponseEnvelope` exposes the decoded body
//! as-is and lets the caller pick the shape it expects for the request it
//! made (`auth()` or `content()`). The status line is kept but never acted
//! upon.

use std::cell::OnceCell;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Answer of the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Answer of the object endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentResponse {
    pub content: Value,
}

/// One transport result with a lazily decoded JSON payload.
///
/// The body is parsed on first access and the outcome, success or failure,
/// is cached for the lifetime of the envelope.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: u16,
    reason: String,
    raw_body: String,
    payload: OnceCell<Result<Value, String>>,
}

impl ResponseEnvelope {
    pub fn decode(response: HttpResponse) -> Self {
        log::debug!("received HTTP {} {}", response.status, response.reason);
        Self {
            status: response.status,
            reason: response.reason,
            raw_body: response.body,
            payload: OnceCell::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// The top-level decoded JSON value.
    pub fn payload(&self) -> Result<&Value, ApiError> {
        self.payload
            .get_or_init(|| serde_json::from_str(&self.raw_body).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|msg| ApiError::MalformedResponse(msg.clone()))
    }

    /// Read the payload as an auth answer. A numeric `token` is kept in
    /// its decimal form. `Ok(None)` when the field is missing, empty or of
    /// any other type.
    pub fn auth(&self) -> Result<Option<AuthResponse>, ApiError> {
        let token = match self.payload()?.get("token") {
            Some(Value::String(token)) => token.clone(),
            Some(Value::Number(token)) => token.to_string(),
            _ => return Ok(None),
        };
        Ok((!token.is_empty()).then_some(AuthResponse { token }))
    }

    /// Read the payload as an object answer. `Ok(None)` when there is no
    /// `content` key.
    pub fn content(&self) -> Result<Option<ContentResponse>, ApiError> {
        let payload = self.payload()?;
        Ok(payload
            .get("content")
            .map(|content| ContentResponse { content: content.clone() }))
    }
}

impl ContentResponse {
    /// Whether the content counts as a success for action endpoints, which
    /// answer with `true`, a non-zero id or a non-empty record.
    pub fn is_truthy(&self) -> bool {
        match &self.content {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }
}
