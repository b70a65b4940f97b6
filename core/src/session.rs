//! Session token holder.
//!
//! The token is set by a successful login handshake (or seeded from the
//! configuration) and only cleared by an explicit `clear`. It is never
//! revalidated against the server.

use std::fmt;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store a token. An empty token leaves the session unauthenticated.
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
