//! Credential/Session Manager Boundary
//!
//! The coordinator consumes credentials, it never owns the auth flow. A host
//! implementation of [`CredentialSource`] is expected to transparently refresh
//! tokens near expiry; a `None` return means "provider unauthenticated" and
//! callers degrade gracefully rather than fail the session.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::error::Result;

/// An access token for a premium provider session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Opaque bearer token value. Never log this directly.
    pub token: String,
    /// Expiry instant, when the issuer reports one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Whether the token expires within `buffer` of `now`.
    ///
    /// Tokens without a reported expiry never count as expiring.
    pub fn expires_within(&self, buffer: Duration, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + buffer,
            None => false,
        }
    }
}

/// External credential/session manager.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Get a currently-valid access token for the given user.
    ///
    /// Implementations refresh ahead of expiry; `Ok(None)` means the user has
    /// no usable session with the premium provider.
    async fn get_valid_access_token(&self, user_id: &str) -> Result<Option<AccessToken>>;
}

/// Fixed token table, for tests and demos.
#[derive(Debug, Default)]
pub struct StaticCredentialSource {
    tokens: HashMap<String, AccessToken>,
}

impl StaticCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, user_id: impl Into<String>, token: AccessToken) -> Self {
        self.tokens.insert(user_id.into(), token);
        self
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    async fn get_valid_access_token(&self, user_id: &str) -> Result<Option<AccessToken>> {
        Ok(self.tokens.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_buffer_check() {
        let now = Utc::now();
        let token = AccessToken::new("t", Some(now + Duration::minutes(3)));

        assert!(token.expires_within(Duration::minutes(5), now));
        assert!(!token.expires_within(Duration::minutes(1), now));

        let no_expiry = AccessToken::new("t", None);
        assert!(!no_expiry.expires_within(Duration::minutes(5), now));
    }

    #[tokio::test]
    async fn static_source_returns_configured_tokens() {
        let source = StaticCredentialSource::new()
            .with_token("user-1", AccessToken::new("abc", None));

        let token = source.get_valid_access_token("user-1").await.unwrap();
        assert_eq!(token.unwrap().token, "abc");

        let missing = source.get_valid_access_token("user-2").await.unwrap();
        assert!(missing.is_none());
    }
}
