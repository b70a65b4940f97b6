//! Request building.
//!
//! # Design
//! A `LogicalRequest` says what the caller wants (object, action, params);
//! `build` turns it into an `HttpRequest` for the configured API style and
//! request method. Two placement rules drive the wire shape:
//! - REST style puts `{object}/{action}` in the path; POST style targets the
//!   single `api/post` endpoint and folds `object` and `action` into the
//!   parameters.
//! - GET requests carry everything in the query string. POST requests carry
//!   the parameters in the body, but the token still travels in the query.
//!
//! Object and action are inserted into the path verbatim; nothing is
//! escaped.

use crate::config::{ApiStyle, ClientConfig, LoginMethod};
use crate::http::{Endpoint, HttpMethod, HttpRequest, Params, Scalar};
use crate::session::Session;

/// Version reported in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Headers sent with every request. Caller headers never replace these.
pub fn default_headers() -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), format!("alternc-core-{VERSION}")),
        ("Accept-Encoding".to_string(), "*".to_string()),
    ]
}

/// The caller's intent, independent of the wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalRequest {
    pub object: String,
    pub action: String,
    pub params: Params,
}

impl LogicalRequest {
    pub fn new(object: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            action: action.into(),
            params: Params::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }
}

/// Build the wire request for a logical call, attaching the session token
/// when there is one.
pub fn build(logical: &LogicalRequest, config: &ClientConfig, session: &Session) -> HttpRequest {
    let (endpoint, path, params) = match config.api_style() {
        ApiStyle::Rest => (
            Endpoint::Rest,
            format!("{}/{}", logical.object, logical.action),
            logical.params.clone(),
        ),
        ApiStyle::Post => {
            let mut params = Params::new();
            params.insert("object".to_string(), logical.object.as_str().into());
            params.insert("action".to_string(), logical.action.as_str().into());
            params.extend(logical.params.clone());
            (Endpoint::Post, String::new(), params)
        }
    };
    assemble(config, endpoint, path, params, session.token())
}

/// Build the login handshake request for the configured login method. It is
/// sent like any other call, without a token.
pub fn build_login(config: &ClientConfig) -> HttpRequest {
    let mut params = Params::new();
    let endpoint = match config.login_method() {
        LoginMethod::SharedSecret => {
            params.insert("secret".to_string(), config.secret().into());
            if let Some(user) = config.user() {
                params.insert("login".to_string(), user.into());
            }
            Endpoint::SharedSecret
        }
        LoginMethod::User => {
            if let Some(user) = config.user() {
                params.insert("user".to_string(), user.into());
            }
            params.insert("password".to_string(), config.secret().into());
            Endpoint::Login
        }
    };
    assemble(config, endpoint, String::new(), params, None)
}

fn assemble(
    config: &ClientConfig,
    endpoint: Endpoint,
    path: String,
    params: Params,
    token: Option<&str>,
) -> HttpRequest {
    let method = HttpMethod::from(config.request_method());

    // Caller params win over the token on key collision.
    let mut query = Params::new();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        query.insert("token".to_string(), token.into());
    }
    let body = match method {
        HttpMethod::Get => {
            query.extend(params);
            None
        }
        HttpMethod::Post => Some(params),
    };

    let mut url = format!("{}/{}", config.url(), endpoint.root());
    if !path.is_empty() {
        url.push('/');
        url.push_str(&path);
    }

    log::debug!("built {method} request for {url}");

    HttpRequest {
        method,
        endpoint,
        path,
        url,
        headers: default_headers(),
        query,
        body,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::PartialConfig;

    fn config(explicit: PartialConfig) -> ClientConfig {
        ClientConfig::resolve(explicit.url("http://x").secret("s"), &HashMap::new()).unwrap()
    }

    fn token_session() -> Session {
        Session::new(Some("abc".to_string()))
    }

    #[test]
    fn rest_style_targets_object_action_path() {
        let cfg = config(PartialConfig::new().api_style("rest"));
        let req = build(&LogicalRequest::new("account", "find"), &cfg, &Session::default());
        assert_eq!(req.endpoint, Endpoint::Rest);
        assert_eq!(req.path, "account/find");
        assert_eq!(req.url, "http://x/api/rest/account/find");
        assert!(!req.query.contains_key("token"));
        assert!(!req.body.as_ref().unwrap().contains_key("token"));
    }

    #[test]
    fn rest_style_does_not_escape_segments() {
        let cfg = config(PartialConfig::new());
        let req = build(&LogicalRequest::new("a/b", "c d"), &cfg, &Session::default());
        assert_eq!(req.path, "a/b/c d");
    }

    #[test]
    fn post_style_always_targets_fixed_endpoint() {
        let cfg = config(PartialConfig::new().api_style("post"));
        for (object, action) in [("account", "find"), ("domain", "add"), ("ftp", "del")] {
            let req = build(&LogicalRequest::new(object, action), &cfg, &Session::default());
            assert_eq!(req.endpoint, Endpoint::Post);
            assert_eq!(req.path, "");
            assert_eq!(req.url, "http://x/api/post");
            let body = req.body.unwrap();
            assert_eq!(body["object"], Scalar::from(object));
            assert_eq!(body["action"], Scalar::from(action));
        }
    }

    #[test]
    fn post_method_puts_token_in_query_only() {
        let cfg = config(PartialConfig::new().request_method("POST"));
        let req = build(&LogicalRequest::new("account", "find").param("uid", 2000), &cfg, &token_session());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.query.get("token"), Some(&Scalar::from("abc")));
        let body = req.body.unwrap();
        assert!(!body.contains_key("token"));
        assert_eq!(body.get("uid"), Some(&Scalar::from(2000)));
    }

    #[test]
    fn get_method_puts_everything_in_query() {
        let cfg = config(PartialConfig::new().request_method("GET").api_style("post"));
        let req = build(&LogicalRequest::new("domain", "find").param("dom", "example.org"), &cfg, &token_session());
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
        let keys: Vec<&str> = req.query.keys().map(String::as_str).collect();
        assert_eq!(keys, ["action", "dom", "object", "token"]);
    }

    #[test]
    fn caller_param_wins_over_session_token() {
        let cfg = config(PartialConfig::new().request_method("GET"));
        let req = build(&LogicalRequest::new("account", "find").param("token", "mine"), &cfg, &token_session());
        assert_eq!(req.query["token"], Scalar::from("mine"));
    }

    #[test]
    fn default_headers_are_always_present() {
        let cfg = config(PartialConfig::new());
        let mut req = build(&LogicalRequest::new("account", "find"), &cfg, &Session::default());
        req.merge_headers([("Accept-Encoding", "gzip")]);
        assert_eq!(req.header("User-Agent"), Some(format!("alternc-core-{VERSION}").as_str()));
        assert_eq!(req.header("Accept-Encoding"), Some("*"));
    }

    #[test]
    fn shared_secret_login_shape() {
        let cfg = config(PartialConfig::new().user("admin"));
        let req = build_login(&cfg);
        assert_eq!(req.endpoint, Endpoint::SharedSecret);
        assert_eq!(req.url, "http://x/api/auth/sharedsecret");
        assert!(req.query.is_empty());
        let body = req.body.unwrap();
        assert_eq!(body["secret"], Scalar::from("s"));
        assert_eq!(body["login"], Scalar::from("admin"));
    }

    #[test]
    fn user_login_shape_over_get() {
        let cfg = config(PartialConfig::new().user("admin").login_method("user").request_method("GET"));
        let req = build_login(&cfg);
        assert_eq!(req.endpoint, Endpoint::Login);
        assert_eq!(req.url, "http://x/api/auth/login");
        assert!(req.body.is_none());
        assert_eq!(req.query["user"], Scalar::from("admin"));
        assert_eq!(req.query["password"], Scalar::from("s"));
        assert!(!req.query.contains_key("token"));
    }
}
