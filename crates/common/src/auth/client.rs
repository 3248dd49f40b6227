//! OAuth 2.0 client implementation with PKCE support
//!
//! Handles browser-based authorization flow with the identity provider,
//! including:
//! - PKCE challenge generation
//! - Browser authorization URL building
//! - Authorization code exchange
//! - Token refresh

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;
use vaultwatch_domain::constants::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use vaultwatch_domain::Session;

use super::pkce::PkceChallenge;
use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthProviderError, TokenResponse};

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned an error
    Provider(OAuthProviderError),

    /// State parameter mismatch (CSRF attack detected)
    StateMismatch { expected: String, received: String },

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),

    /// PKCE challenge generation failed
    PkceError(String),
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Provider(e) => write!(f, "OAuth error: {e}"),
            Self::StateMismatch { expected, received } => {
                write!(f, "State mismatch (CSRF): expected {expected}, received {received}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::PkceError(msg) => write!(f, "PKCE generation error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 client with PKCE support
///
/// Implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) against the
/// Bungie.net endpoints. The flow is PKCE-only; no client secret exists.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Option<Client>,
    current_challenge: Arc<Mutex<Option<PkceChallenge>>>,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// Setting `VAULTWATCH_OAUTH_DISABLE_HTTP` leaves the client without an
    /// HTTP transport; any request attempt then fails fast. Used by tests
    /// that must never touch the network.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client = if std::env::var_os("VAULTWATCH_OAUTH_DISABLE_HTTP").is_some() {
            None
        } else {
            let builder = Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .user_agent(USER_AGENT);
            Some(builder.build().unwrap_or_else(|_| Client::new()))
        };

        Self { config, client, current_challenge: Arc::new(Mutex::new(None)) }
    }

    /// Generate authorization URL for browser-based login
    ///
    /// The user will be redirected to `redirect_uri` after authentication.
    ///
    /// # Returns
    /// Tuple of (authorization_url, state) where state must be validated in
    /// the callback
    ///
    /// # Errors
    /// Returns error if PKCE challenge generation fails
    pub async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        // Generate new PKCE challenge
        let challenge =
            PkceChallenge::generate().map_err(|e| OAuthClientError::PkceError(e.to_string()))?;
        let state = challenge.state.clone();

        // Store challenge for later token exchange
        *self.current_challenge.lock().await = Some(challenge.clone());

        let params = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("state".to_string(), state.clone()),
            ("code_challenge".to_string(), challenge.code_challenge.clone()),
            ("code_challenge_method".to_string(), challenge.challenge_method().to_string()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}?{}", self.config.authorize_url, query_string);

        debug!("Generated authorization URL");

        Ok((url, state))
    }

    /// Exchange authorization code for a session
    ///
    /// Called after user completes browser authorization and is redirected
    /// back. Validates the state parameter, exchanges the authorization code
    /// with the stored PKCE verifier, and computes the session expiry.
    ///
    /// # Errors
    /// Returns error if:
    /// - State mismatch (CSRF attack)
    /// - Token exchange fails
    /// - Response parsing fails
    pub async fn exchange_code_for_session(
        &self,
        code: &str,
        state: &str,
    ) -> Result<Session, OAuthClientError> {
        // Retrieve and discard the challenge; it is single-use either way
        let challenge =
            self.current_challenge.lock().await.take().ok_or_else(|| {
                OAuthClientError::ConfigError("No PKCE challenge found".to_string())
            })?;

        // Validate state parameter (CSRF protection)
        if challenge.state != state {
            return Err(OAuthClientError::StateMismatch {
                expected: challenge.state,
                received: state.to_string(),
            });
        }

        let request_body = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("code_verifier".to_string(), challenge.code_verifier.clone()),
        ];

        let token_response = self.post_token_request(&request_body).await?;

        Ok(token_response.into_session(Utc::now().timestamp()))
    }

    /// Refresh the session using a refresh token
    ///
    /// Used for obtaining new access tokens without user interaction.
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - Refresh fails
    /// - Token is invalid/revoked
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let params = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];

        let token_response = self.post_token_request(&params).await?;

        Ok(token_response.into_session(Utc::now().timestamp()))
    }

    async fn post_token_request(
        &self,
        form: &[(String, String)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| OAuthClientError::ConfigError("HTTP client disabled".to_string()))?;

        let response = client
            .post(&self.config.token_url)
            .header("X-API-Key", &self.config.api_key)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: OAuthProviderError =
                response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;
            return Err(OAuthClientError::Provider(error));
        }

        response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))
    }

    /// Get the configured redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

// Implement OAuthClientTrait for OAuthClient
#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        self.generate_authorization_url().await
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        state: &str,
    ) -> Result<Session, OAuthClientError> {
        self.exchange_code_for_session(code, state).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, OAuthClientError> {
        self.refresh_session(refresh_token).await
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uri()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_config() -> OAuthConfig {
        OAuthConfig::bungie("test_client_id".to_string(), "test_api_key".to_string())
    }

    fn config_for_server(server: &MockServer) -> OAuthConfig {
        OAuthConfig::new(
            "https://www.bungie.net/en/OAuth/Authorize".to_string(),
            format!("{}/Platform/App/OAuth/Token/", server.uri()),
            "test_client_id".to_string(),
            "test_api_key".to_string(),
            "http://localhost:7777/callback".to_string(),
        )
    }

    #[tokio::test]
    async fn test_generate_authorization_url() {
        let client = OAuthClient::new(create_test_config());

        let (url, state) = client.generate_authorization_url().await.unwrap();

        assert!(url.starts_with("https://www.bungie.net/en/OAuth/Authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("code_challenge="));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={state}")));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A7777%2Fcallback"));
    }

    #[tokio::test]
    async fn test_state_validation() {
        let client = OAuthClient::new(create_test_config());

        client.generate_authorization_url().await.unwrap();

        // Attempt exchange with wrong state
        let result = client.exchange_code_for_session("test_code", "wrong_state").await;

        assert!(matches!(result, Err(OAuthClientError::StateMismatch { .. })));
    }

    #[tokio::test]
    async fn test_exchange_requires_pending_challenge() {
        let client = OAuthClient::new(create_test_config());

        // No generate_authorization_url call beforehand
        let result = client.exchange_code_for_session("code", "state").await;
        assert!(matches!(result, Err(OAuthClientError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_verifier_and_builds_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Platform/App/OAuth/Token/"))
            .and(header("X-API-Key", "test_api_key"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "T1",
                "refresh_token": "R1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(config_for_server(&server));
        let (_, state) = client.generate_authorization_url().await.unwrap();

        let before = Utc::now().timestamp();
        let session = client.exchange_code_for_session("abc", &state).await.unwrap();
        let after = Utc::now().timestamp();

        assert_eq!(session.access_token, "T1");
        assert_eq!(session.refresh_token, Some("R1".to_string()));
        let expires_at = session.expires_at.unwrap();
        assert!(expires_at >= before + 3590 && expires_at <= after + 3590);
    }

    #[tokio::test]
    async fn test_refresh_session_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Platform/App/OAuth/Token/"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=R1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "T2",
                "refresh_token": "R2",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(config_for_server(&server));
        let session = client.refresh_session("R1").await.unwrap();

        assert_eq!(session.access_token, "T2");
        assert_eq!(session.refresh_token, Some("R2".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Platform/App/OAuth/Token/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "refresh token revoked"
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(config_for_server(&server));
        let result = client.refresh_session("stale").await;

        assert!(matches!(result, Err(OAuthClientError::Provider(_))));
    }

    #[tokio::test]
    async fn test_refresh_with_empty_token() {
        let client = OAuthClient::new(create_test_config());

        let result = client.refresh_session("").await;
        assert!(matches!(result, Err(OAuthClientError::NoRefreshToken)));
    }

    #[test]
    fn test_oauth_client_creation() {
        let client = OAuthClient::new(create_test_config());

        assert_eq!(client.redirect_uri(), "http://localhost:7777/callback");
        assert_eq!(client.config().client_id, "test_client_id");
    }
}
