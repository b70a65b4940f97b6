//! Client configuration and its resolution against the environment.
//!
//! # Design
//! `PartialConfig` carries whatever the caller supplied explicitly. It is
//! merged with an environment snapshot by `ClientConfig::resolve`, which is
//! the only place values are validated. The environment is passed in as a
//! plain map so resolution stays deterministic; reading the process
//! environment is left to the caller.
//!
//! Enumerated options stay raw strings in `PartialConfig` so that a bad
//! value (say, from a deserialized settings file) is reported as a
//! `ConfigError` rather than a serde error.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable holding the panel base URL.
pub const URL_ENV: &str = "ALTERNC_PHPAPI_ALTERNC_URL";

/// Environment variable holding the login user.
pub const USER_ENV: &str = "ALTERNC_PHPAPI_ALTERNC_USER";

/// Environment variable holding the shared secret (or password).
pub const SECRET_ENV: &str = "ALTERNC_PHPAPI_ALTERNC_SECRET";

/// An option restricted to a fixed set of spellings.
trait ConfigOption: Sized + Copy + 'static {
    const KEY: &'static str;
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn parse_option(value: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|option| option.as_str() == value)
            .ok_or_else(|| ConfigError::InvalidOption {
                key: Self::KEY,
                value: value.to_string(),
                allowed: Self::ALL.iter().map(|option| option.as_str()).collect(),
            })
    }
}

/// HTTP method used for every call, authentication included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestMethod {
    #[serde(rename = "GET")]
    Get,
    #[default]
    #[serde(rename = "POST")]
    Post,
}

impl RequestMethod {
    pub const ALL: &'static [RequestMethod] = &[RequestMethod::Post, RequestMethod::Get];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }
}

impl ConfigOption for RequestMethod {
    const KEY: &'static str = "request_method";
    const ALL: &'static [Self] = RequestMethod::ALL;

    fn as_str(self) -> &'static str {
        RequestMethod::as_str(self)
    }
}

/// Which credential pair is exchanged for a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    /// `{secret, login}` against the shared-secret endpoint.
    #[default]
    #[serde(rename = "secret")]
    SharedSecret,
    /// `{user, password}` against the login endpoint.
    User,
}

impl LoginMethod {
    pub const ALL: &'static [LoginMethod] = &[LoginMethod::SharedSecret, LoginMethod::User];

    pub fn as_str(self) -> &'static str {
        match self {
            LoginMethod::SharedSecret => "secret",
            LoginMethod::User => "user",
        }
    }
}

impl ConfigOption for LoginMethod {
    const KEY: &'static str = "login_method";
    const ALL: &'static [Self] = LoginMethod::ALL;

    fn as_str(self) -> &'static str {
        LoginMethod::as_str(self)
    }
}

/// Whether object and action travel in the URL path or in the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    #[default]
    Rest,
    Post,
}

impl ApiStyle {
    pub const ALL: &'static [ApiStyle] = &[ApiStyle::Post, ApiStyle::Rest];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiStyle::Rest => "rest",
            ApiStyle::Post => "post",
        }
    }
}

impl ConfigOption for ApiStyle {
    const KEY: &'static str = "api_style";
    const ALL: &'static [Self] = ApiStyle::ALL;

    fn as_str(self) -> &'static str {
        ApiStyle::as_str(self)
    }
}

macro_rules! option_string_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as ConfigOption>::parse_option(s)
            }
        }
    )*};
}

option_string_impls!(RequestMethod, LoginMethod, ApiStyle);

/// Explicitly supplied configuration. Every field is optional; anything
/// left out falls back to the environment or to a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub url: Option<String>,
    pub user: Option<String>,
    pub secret: Option<String>,
    pub request_method: Option<String>,
    pub login_method: Option<String>,
    pub api_style: Option<String>,
    pub token: Option<String>,
}

impl PartialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn request_method(mut self, method: impl ToString) -> Self {
        self.request_method = Some(method.to_string());
        self
    }

    pub fn login_method(mut self, method: impl ToString) -> Self {
        self.login_method = Some(method.to_string());
        self
    }

    pub fn api_style(mut self, style: impl ToString) -> Self {
        self.api_style = Some(style.to_string());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Validated client configuration. Immutable once resolved; the session
/// token lives in `Session`, seeded from `token`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    url: String,
    user: Option<String>,
    secret: String,
    request_method: RequestMethod,
    login_method: LoginMethod,
    api_style: ApiStyle,
    token: Option<String>,
}

impl ClientConfig {
    /// Merge `explicit` with `env` and validate the result.
    ///
    /// A key present in `explicit` always wins, even when empty; `env` is
    /// only looked up for keys the caller left out. Empty strings count as
    /// missing for the required-field checks.
    pub fn resolve(explicit: PartialConfig, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let from_env = |name: &str| env.get(name).cloned();

        let url = explicit
            .url
            .or_else(|| from_env(URL_ENV))
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingUrl(URL_ENV))?;
        let secret = explicit
            .secret
            .or_else(|| from_env(SECRET_ENV))
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingSecret(SECRET_ENV))?;
        let user = explicit
            .user
            .or_else(|| from_env(USER_ENV))
            .filter(|v| !v.is_empty());

        let request_method = parse_or_default::<RequestMethod>(explicit.request_method.as_deref())?;
        let login_method = parse_or_default::<LoginMethod>(explicit.login_method.as_deref())?;
        let api_style = parse_or_default::<ApiStyle>(explicit.api_style.as_deref())?;

        if login_method == LoginMethod::User && user.is_none() {
            return Err(ConfigError::MissingUser(USER_ENV));
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            user,
            secret,
            request_method,
            login_method,
            api_style,
            token: explicit.token.filter(|t| !t.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn request_method(&self) -> RequestMethod {
        self.request_method
    }

    pub fn login_method(&self) -> LoginMethod {
        self.login_method
    }

    pub fn api_style(&self) -> ApiStyle {
        self.api_style
    }

    /// Token supplied at construction, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .field("request_method", &self.request_method)
            .field("login_method", &self.login_method)
            .field("api_style", &self.api_style)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn parse_or_default<T: ConfigOption + Default>(value: Option<&str>) -> Result<T, ConfigError> {
    value.map_or_else(|| Ok(T::default()), T::parse_option)
}
