//! Client for the AlternC panel API.
//!
//! # Design
//! `AlterncClient` owns the resolved configuration and the session token.
//! Authentication is a one-time handshake: once a token is present it is
//! reused for every call and never revalidated, so a token the server has
//! since expired stays in place until the caller runs `clear_token`.
//!
//! Every call returns its own `ResponseEnvelope`; the client keeps no
//! record of previous responses.
//!
//! The token check-then-set in `ensure_authenticated` takes `&mut self`, so
//! sharing one client between threads needs an outer lock, which then also
//! serializes the handshake.

use std::collections::HashMap;

use crate::config::{ClientConfig, PartialConfig};
use crate::error::{ApiError, AuthFailure};
use crate::http::{HttpRequest, Params, Transport};
use crate::request::{self, LogicalRequest};
use crate::response::ResponseEnvelope;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct AlterncClient {
    config: ClientConfig,
    session: Session,
}

impl AlterncClient {
    pub fn new(config: ClientConfig) -> Self {
        let session = Session::new(config.token().map(str::to_string));
        Self { config, session }
    }

    /// Resolve `explicit` against `env` and build a client from the result.
    /// Configuration problems come back as `ApiError::Config`.
    pub fn from_parts(explicit: PartialConfig, env: &HashMap<String, String>) -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::resolve(explicit, env)?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn url(&self) -> &str {
        self.config.url()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Forget the current token so the next `ensure_authenticated` logs in
    /// again.
    pub fn clear_token(&mut self) {
        self.session.clear();
    }

    /// Make sure the session holds a token. Returns `false` on any failure,
    /// without saying which.
    pub fn ensure_authenticated<T: Transport>(&mut self, transport: &mut T) -> bool {
        ensure_authenticated(&mut self.session, &self.config, transport)
    }

    /// Like `ensure_authenticated`, but reports why the handshake failed.
    pub fn try_authenticate<T: Transport>(&mut self, transport: &mut T) -> Result<(), AuthFailure> {
        try_authenticate(&mut self.session, &self.config, transport)
    }

    /// Build the wire request for a logical call with the current token.
    pub fn build_request(&self, logical: &LogicalRequest) -> HttpRequest {
        request::build(logical, &self.config, &self.session)
    }

    /// Send one logical request and wrap the answer. Does not authenticate
    /// on its own; call `ensure_authenticated` first.
    pub fn send<T: Transport>(&self, transport: &mut T, logical: &LogicalRequest) -> Result<ResponseEnvelope, ApiError> {
        self.send_request(transport, &self.build_request(logical))
    }

    /// Send a request obtained from `build_request`, typically after extra
    /// headers were added with `HttpRequest::merge_headers`.
    pub fn send_request<T: Transport>(&self, transport: &mut T, req: &HttpRequest) -> Result<ResponseEnvelope, ApiError> {
        let response = transport.send(req)?;
        Ok(ResponseEnvelope::decode(response))
    }

    /// Shorthand for `send` with an `(object, action, params)` triple.
    pub fn object_request<T: Transport>(
        &self,
        transport: &mut T,
        object: &str,
        action: &str,
        params: Params,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.send(transport, &LogicalRequest::new(object, action).params(params))
    }
}

/// Log in unless `session` already holds a token.
pub fn ensure_authenticated<T: Transport>(session: &mut Session, config: &ClientConfig, transport: &mut T) -> bool {
    match try_authenticate(session, config, transport) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("authentication against {} failed: {err}", config.url());
            false
        }
    }
}

/// Log in unless `session` already holds a token, reporting the failure
/// reason. The session is only touched on success.
pub fn try_authenticate<T: Transport>(
    session: &mut Session,
    config: &ClientConfig,
    transport: &mut T,
) -> Result<(), AuthFailure> {
    if session.is_authenticated() {
        log::debug!("token already present, skipping login");
        return Ok(());
    }

    let req = request::build_login(config);
    let envelope = ResponseEnvelope::decode(transport.send(&req)?);
    let auth = envelope.auth().map_err(|err| match err {
        ApiError::MalformedResponse(msg) => AuthFailure::MalformedResponse(msg),
        other => AuthFailure::MalformedResponse(other.to_string()),
    })?;

    match auth {
        Some(auth) => {
            session.set_token(auth.token);
            log::info!("obtained session token from {} using {} login", config.url(), config.login_method());
            Ok(())
        }
        None => Err(AuthFailure::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{ConfigError, TransportError};
    use crate::http::{Endpoint, HttpMethod, HttpResponse, Scalar};

    /// Replies with a fixed body and records every request it sees.
    struct StubTransport {
        body: String,
        fail: bool,
        sent: Vec<HttpRequest>,
    }

    impl StubTransport {
        fn replying(body: &str) -> Self {
            Self {
                body: body.to_string(),
                fail: false,
                sent: Vec::new(),
            }
        }

        fn failing() -> Self {
            Self {
                body: String::new(),
                fail: true,
                sent: Vec::new(),
            }
        }
    }

    impl Transport for StubTransport {
        fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.push(request.clone());
            if self.fail {
                return Err(TransportError::new("connection refused"));
            }
            Ok(HttpResponse {
                status: 200,
                reason: "OK".to_string(),
                headers: Vec::new(),
                body: self.body.clone(),
            })
        }
    }

    fn client(explicit: PartialConfig) -> AlterncClient {
        AlterncClient::from_parts(explicit.url("http://x").secret("s"), &HashMap::new()).unwrap()
    }

    #[test]
    fn token_response_authenticates() {
        let mut c = client(PartialConfig::new().login_method("secret"));
        let mut transport = StubTransport::replying(r#"{"token":"abc"}"#);
        assert!(c.ensure_authenticated(&mut transport));
        assert_eq!(c.token(), Some("abc"));
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].endpoint, Endpoint::SharedSecret);
    }

    #[test]
    fn second_call_makes_no_transport_call() {
        let mut c = client(PartialConfig::new());
        let mut transport = StubTransport::replying(r#"{"token":"abc"}"#);
        assert!(c.ensure_authenticated(&mut transport));
        assert!(c.ensure_authenticated(&mut transport));
        assert_eq!(transport.sent.len(), 1);
    }

    #[test]
    fn configured_token_short_circuits() {
        let mut c = client(PartialConfig::new().token("xxx_token_xxx"));
        let mut transport = StubTransport::failing();
        assert!(c.ensure_authenticated(&mut transport));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn missing_token_fails_and_leaves_session_empty() {
        let mut c = client(PartialConfig::new());
        let mut transport = StubTransport::replying(r#"{"nope":1}"#);
        assert!(!c.ensure_authenticated(&mut transport));
        assert_eq!(c.token(), None);
        assert!(matches!(c.try_authenticate(&mut transport), Err(AuthFailure::MissingToken)));
    }

    #[test]
    fn failure_reasons_are_reported() {
        let mut c = client(PartialConfig::new());
        assert!(matches!(
            c.try_authenticate(&mut StubTransport::failing()),
            Err(AuthFailure::Transport(_))
        ));
        assert!(matches!(
            c.try_authenticate(&mut StubTransport::replying("<html>")),
            Err(AuthFailure::MalformedResponse(_))
        ));
        assert!(!c.ensure_authenticated(&mut StubTransport::failing()));
        assert_eq!(c.token(), None);
    }

    #[test]
    fn user_login_uses_login_endpoint_and_request_method() {
        let mut c = client(PartialConfig::new().login_method("user").user("admin").request_method("GET"));
        let mut transport = StubTransport::replying(r#"{"token":"t"}"#);
        assert!(c.ensure_authenticated(&mut transport));
        let login = &transport.sent[0];
        assert_eq!(login.endpoint, Endpoint::Login);
        assert_eq!(login.method, HttpMethod::Get);
        assert_eq!(login.query["user"], Scalar::from("admin"));
        assert_eq!(login.query["password"], Scalar::from("s"));
    }

    #[test]
    fn clear_token_forces_new_handshake() {
        let mut c = client(PartialConfig::new());
        let mut transport = StubTransport::replying(r#"{"token":"abc"}"#);
        assert!(c.ensure_authenticated(&mut transport));
        c.clear_token();
        assert!(c.ensure_authenticated(&mut transport));
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn object_request_carries_token_and_returns_envelope() {
        let mut c = client(PartialConfig::new());
        let mut auth = StubTransport::replying(r#"{"token":"abc"}"#);
        assert!(c.ensure_authenticated(&mut auth));

        let mut transport = StubTransport::replying(r#"{"code":0,"content":true}"#);
        let envelope = c
            .object_request(&mut transport, "account", "lock", Params::from([("uid".to_string(), 2000.into())]))
            .unwrap();
        assert_eq!(envelope.payload().unwrap()["content"], json!(true));

        let sent = &transport.sent[0];
        assert_eq!(sent.url, "http://x/api/rest/account/lock");
        assert_eq!(sent.query["token"], Scalar::from("abc"));
        assert_eq!(sent.body.as_ref().unwrap()["uid"], Scalar::from(2000));
    }

    #[test]
    fn numeric_token_authenticates() {
        let mut c = client(PartialConfig::new());
        assert!(c.ensure_authenticated(&mut StubTransport::replying(r#"{"token":12345}"#)));
        assert_eq!(c.token(), Some("12345"));
    }

    #[test]
    fn caller_headers_reach_the_transport() {
        let c = client(PartialConfig::new());
        let mut req = c.build_request(&LogicalRequest::new("account", "find"));
        req.merge_headers([("X-Request-Id", "42"), ("Accept-Encoding", "gzip")]);

        let mut transport = StubTransport::replying(r#"{"content":[]}"#);
        let envelope = c.send_request(&mut transport, &req).unwrap();
        assert_eq!(envelope.content().unwrap().unwrap().content, json!([]));

        let sent = &transport.sent[0];
        assert_eq!(sent.header("X-Request-Id"), Some("42"));
        assert_eq!(sent.header("Accept-Encoding"), Some("*"));
        assert!(sent.header("User-Agent").is_some_and(|ua| ua.starts_with("alternc-core-")));
    }

    #[test]
    fn invalid_config_is_reported_as_api_error() {
        let err = AlterncClient::from_parts(PartialConfig::new().secret("s"), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::MissingUrl(_))));

        let err = AlterncClient::from_parts(PartialConfig::new().url("x").secret("s").api_style("soap"), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::InvalidOption { key: "api_style", .. })));
    }

    #[test]
    fn transport_errors_propagate_unchanged() {
        let c = client(PartialConfig::new());
        let err = c
            .send(&mut StubTransport::failing(), &LogicalRequest::new("account", "find"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
