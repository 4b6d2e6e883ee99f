//! Opaque credential types. TOTP/HMAC/OAuth flows that mint these values
//! live outside the core entirely; this crate only carries the result.

use common::types::Ts;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bearer token the transport layer attaches to authenticated requests.
/// The core never inspects its contents, only its expiry.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    value: String,
    expires_at: Option<Ts>,
}

impl AccessToken {
    /// Wrap a pre-minted token value, optionally expiring at `expires_at`.
    #[must_use]
    pub const fn new(value: String, expires_at: Option<Ts>) -> Self {
        Self { value, expires_at }
    }

    /// The raw token value, for attaching to an outbound request.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// `true` if this token has an expiry and `now` is at or past it.
    #[must_use]
    pub fn is_expired(&self, now: Ts) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken").field("value", &"<redacted>").field("expires_at", &self.expires_at).finish()
    }
}

/// Per-venue credentials handed to a transport connection at `start`.
/// Assembled once at startup from environment variables (§6) and passed by
/// value; never logged or persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// Venue identifier this bundle authenticates against.
    pub venue: String,
    /// API key or client id, if the venue requires one up front.
    pub api_key: Option<String>,
    /// Current access token, if one is already minted.
    pub access_token: Option<AccessToken>,
}

impl CredentialBundle {
    /// Build a bundle with no token yet minted.
    #[must_use]
    pub const fn new(venue: String, api_key: Option<String>) -> Self {
        Self { venue, api_key, access_token: None }
    }

    /// Attach a freshly minted token, replacing any prior one.
    pub fn with_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("venue", &self.venue)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token)
            .finish()
    }
}

/// Error surfaced when a connection cannot be authenticated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No access token present in the bundle.
    #[error("credential bundle for {0} carries no access token")]
    MissingToken(String),
    /// The bundle's access token is expired.
    #[error("access token for {0} expired")]
    Expired(String),
}

impl CredentialBundle {
    /// Validate that the bundle carries a live token as of `now`.
    ///
    /// # Errors
    /// Returns [`AuthError::MissingToken`] if no token is present, or
    /// [`AuthError::Expired`] if it has expired.
    pub fn require_live_token(&self, now: Ts) -> Result<&AccessToken, AuthError> {
        let token = self.access_token.as_ref().ok_or_else(|| AuthError::MissingToken(self.venue.clone()))?;
        if token.is_expired(now) {
            return Err(AuthError::Expired(self.venue.clone()));
        }
        Ok(token)
    }
}
