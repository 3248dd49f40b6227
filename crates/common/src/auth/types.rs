//! OAuth 2.0 types and structures
//!
//! Defines unified data structures for OAuth token responses, provider
//! errors, and configuration used by the Bungie.net PKCE flow.

use std::fmt;

use serde::Deserialize;
use vaultwatch_domain::constants::TOKEN_EXPIRY_SKEW_SECS;
use vaultwatch_domain::Session;

/// OAuth token response from the authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749).
/// Deserializes responses from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
}

impl TokenResponse {
    /// Convert into a persistable session.
    ///
    /// `expires_at` is `now + expires_in - 10s` so a token is retired
    /// slightly before the provider would reject it.
    #[must_use]
    pub fn into_session(self, now_epoch: i64) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Some(now_epoch + self.expires_in - TOKEN_EXPIRY_SKEW_SECS),
        }
    }
}

/// OAuth configuration for the identity provider
///
/// All four endpoints and identifiers must exactly match what is registered
/// with the provider; the redirect URI in particular is compared verbatim.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Browser authorization endpoint.
    pub authorize_url: String,

    /// Token exchange/refresh endpoint.
    pub token_url: String,

    /// OAuth client ID (public client, no secret).
    pub client_id: String,

    /// API key sent as `X-API-Key` alongside token requests.
    pub api_key: String,

    /// Redirect URI (loopback for desktop apps).
    pub redirect_uri: String,
}

impl OAuthConfig {
    /// Create a new OAuth configuration
    #[must_use]
    pub fn new(
        authorize_url: String,
        token_url: String,
        client_id: String,
        api_key: String,
        redirect_uri: String,
    ) -> Self {
        Self { authorize_url, token_url, client_id, api_key, redirect_uri }
    }

    /// Bungie.net configuration with the standard endpoints.
    #[must_use]
    pub fn bungie(client_id: String, api_key: String) -> Self {
        use vaultwatch_domain::constants::{
            BUNGIE_AUTHORIZE_URL, BUNGIE_TOKEN_URL, REDIRECT_URI,
        };
        Self::new(
            BUNGIE_AUTHORIZE_URL.to_string(),
            BUNGIE_TOKEN_URL.to_string(),
            client_id,
            api_key,
            REDIRECT_URI.to_string(),
        )
    }
}

/// OAuth error response from the authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthProviderError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthProviderError {}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    #[test]
    fn test_token_response_session_conversion() {
        let response = TokenResponse {
            access_token: "access123".to_string(),
            refresh_token: Some("refresh456".to_string()),
            token_type: Some("Bearer".to_string()),
            expires_in: 3600,
        };

        let session = response.into_session(1_000_000);

        assert_eq!(session.access_token, "access123");
        assert_eq!(session.refresh_token, Some("refresh456".to_string()));
        // Expiry is pulled in by the 10 second skew
        assert_eq!(session.expires_at, Some(1_000_000 + 3590));
    }

    #[test]
    fn test_bungie_config_endpoints() {
        let config = OAuthConfig::bungie("client123".to_string(), "key456".to_string());

        assert_eq!(config.authorize_url, "https://www.bungie.net/en/OAuth/Authorize");
        assert_eq!(config.token_url, "https://www.bungie.net/Platform/App/OAuth/Token/");
        assert_eq!(config.redirect_uri, "http://localhost:7777/callback");
        assert_eq!(config.client_id, "client123");
    }

    #[test]
    fn test_oauth_error_display() {
        let error = OAuthProviderError {
            error: "invalid_grant".to_string(),
            error_description: Some("The refresh token is invalid".to_string()),
        };

        let error_string = error.to_string();
        assert!(error_string.contains("invalid_grant"));
        assert!(error_string.contains("refresh token is invalid"));
    }

    #[test]
    fn test_oauth_error_without_description() {
        let error =
            OAuthProviderError { error: "invalid_request".to_string(), error_description: None };

        assert_eq!(error.to_string(), "invalid_request");
    }
}
