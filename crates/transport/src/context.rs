//! Session capability passed into every transport call
//!
//! Dashboard screens used to read the bearer token and the acting user from
//! ambient storage. Here they travel explicitly, so the engine can be driven
//! without any browser-like environment.

use pitlane_core::Role;

/// Who is acting and with which credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    actor: Role,
    bearer_token: Option<String>,
    user_id: Option<String>,
}

impl SessionContext {
    /// Context acting as `actor` with no credentials
    pub fn new(actor: Role) -> Self {
        Self {
            actor,
            bearer_token: None,
            user_id: None,
        }
    }

    /// Attach a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Attach the acting user's id
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Acting role
    pub fn actor(&self) -> Role {
        self.actor
    }

    /// Bearer token, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Acting user id, if any
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Value of the `Authorization` header
    pub fn authorization_header(&self) -> Option<String> {
        self.bearer_token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("actor", &self.actor)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .finish()
    }
}
