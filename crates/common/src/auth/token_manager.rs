//! Token lifecycle manager
//!
//! Owns the OAuth session state machine:
//! `NoSession -> Valid -> Expired -> Refreshing -> Authorizing -> Valid | Failed`
//!
//! - Valid cached sessions are returned without any network call
//! - Expired sessions with a refresh token are refreshed silently
//! - Anything else runs the full interactive PKCE authorization
//! - A failed step never persists a partial session

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vaultwatch_domain::Session;

use super::client::OAuthClientError;
use super::traits::{
    AuthorizationFlow, AuthorizationFlowError, OAuthClientTrait, SessionStore, TokenProvider,
};

/// Fixed sentinel token returned in offline test mode.
pub const TEST_MODE_TOKEN: &str = "TEST_TOKEN";

/// Offline test mode is compiled out of release builds entirely; the env
/// flag alone is never enough to reach the sentinel path.
const TEST_MODE_COMPILED_IN: bool = cfg!(debug_assertions);

fn offline_test_token() -> Option<String> {
    if TEST_MODE_COMPILED_IN && std::env::var_os("VAULTWATCH_TEST_MODE").is_some() {
        Some(TEST_MODE_TOKEN.to_string())
    } else {
        None
    }
}

/// Error type for token manager operations
#[derive(Debug)]
pub enum TokenManagerError {
    /// Session store operation failed
    StoreError(String),

    /// OAuth operation failed
    OAuth(OAuthClientError),

    /// Interactive authorization exceeded its wait bound
    Timeout,

    /// Provider redirected with an error parameter
    ProviderDenied(String),

    /// No tokens available (not authenticated)
    NotAuthenticated,

    /// Missing or invalid configuration
    Configuration(String),

    /// Browser or callback listener failure
    AuthorizationFailed(String),
}

impl std::fmt::Display for TokenManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreError(e) => write!(f, "Session store error: {e}"),
            Self::OAuth(e) => write!(f, "OAuth error: {e}"),
            Self::Timeout => write!(f, "Authorization timed out"),
            Self::ProviderDenied(reason) => write!(f, "Authorization denied: {reason}"),
            Self::NotAuthenticated => write!(f, "Not authenticated (no session)"),
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::AuthorizationFailed(msg) => write!(f, "Authorization failed: {msg}"),
        }
    }
}

impl std::error::Error for TokenManagerError {}

impl From<OAuthClientError> for TokenManagerError {
    fn from(err: OAuthClientError) -> Self {
        Self::OAuth(err)
    }
}

impl From<AuthorizationFlowError> for TokenManagerError {
    fn from(err: AuthorizationFlowError) -> Self {
        match err {
            AuthorizationFlowError::Timeout => Self::Timeout,
            AuthorizationFlowError::Denied(reason) => Self::ProviderDenied(reason),
            AuthorizationFlowError::Failed(msg) => Self::AuthorizationFailed(msg),
        }
    }
}

/// Token lifecycle manager
///
/// Generic over the OAuth client, session store, and interactive
/// authorization flow so each can be swapped for a test double.
///
/// Refresh and interactive authorization are serialized behind a mutex:
/// concurrent callers that discover an expired session at the same time
/// wait for the first one to finish instead of launching duplicate
/// browser flows.
pub struct TokenManager<C, S, F>
where
    C: OAuthClientTrait + 'static,
    S: SessionStore + 'static,
    F: AuthorizationFlow + 'static,
{
    oauth_client: Arc<C>,
    store: Arc<S>,
    flow: Arc<F>,
    auth_lock: Mutex<()>,
}

impl<C, S, F> TokenManager<C, S, F>
where
    C: OAuthClientTrait + 'static,
    S: SessionStore + 'static,
    F: AuthorizationFlow + 'static,
{
    /// Create a new token manager
    #[must_use]
    pub fn new(oauth_client: Arc<C>, store: Arc<S>, flow: Arc<F>) -> Self {
        Self { oauth_client, store, flow, auth_lock: Mutex::new(()) }
    }

    /// Get a currently valid access token
    ///
    /// This is the primary entry point. Walks the lifecycle in order:
    /// cached session, refresh grant, interactive authorization.
    ///
    /// # Errors
    /// Returns error if every path to a valid token fails; a partial or
    /// invalid session is never persisted.
    pub async fn get_valid_token(&self) -> Result<String, TokenManagerError> {
        if let Some(token) = offline_test_token() {
            debug!("Offline test mode active, returning sentinel token");
            return Ok(token);
        }

        // Fast path, no lock: a valid cached session needs no coordination.
        if let Some(session) = self.load_session().await? {
            if session.is_valid_at(Utc::now().timestamp()) {
                debug!("Using cached session");
                return Ok(session.access_token);
            }
        }

        // Slow path: serialize refresh/authorization across callers.
        let _guard = self.auth_lock.lock().await;

        // Re-check after acquiring the lock; another caller may have
        // refreshed while we waited.
        let session = self.load_session().await?;
        if let Some(session) = &session {
            if session.is_valid_at(Utc::now().timestamp()) {
                return Ok(session.access_token.clone());
            }
        }

        if let Some(refresh_token) = session.as_ref().and_then(|s| s.refresh_token.clone()) {
            match self.refresh(&refresh_token).await {
                Ok(session) => return Ok(session.access_token),
                Err(err) => {
                    warn!(error = %err, "Token refresh failed, falling back to authorization");
                }
            }
        }

        let session = self.authorize_interactive().await?;
        Ok(session.access_token)
    }

    /// Whether a session (valid or not) is currently persisted.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.load_session().await, Ok(Some(_)))
    }

    /// Current persisted session, if any.
    ///
    /// # Errors
    /// Returns error if the store read fails
    pub async fn current_session(&self) -> Result<Option<Session>, TokenManagerError> {
        self.load_session().await
    }

    /// Clear the persisted session (logout)
    ///
    /// # Errors
    /// Returns error if deletion fails
    pub async fn logout(&self) -> Result<(), TokenManagerError> {
        self.store.clear().await.map_err(TokenManagerError::StoreError)?;
        info!("Session cleared (logged out)");
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<Session>, TokenManagerError> {
        self.store.load().await.map_err(TokenManagerError::StoreError)
    }

    /// Refresh state: exchange the refresh token and persist the result.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, TokenManagerError> {
        debug!("Refreshing expired session");
        let session = self.oauth_client.refresh_session(refresh_token).await?;
        self.store.save(&session).await.map_err(TokenManagerError::StoreError)?;
        info!("Session refreshed");
        Ok(session)
    }

    /// Authorizing state: full interactive PKCE flow.
    ///
    /// Generates the challenge, hands the authorization URL to the flow
    /// (browser plus local callback listener), exchanges the returned code,
    /// and persists the session. Every failure leaves the store untouched.
    async fn authorize_interactive(&self) -> Result<Session, TokenManagerError> {
        info!("Starting interactive authorization");

        let (auth_url, _state) = self.oauth_client.generate_authorization_url().await?;

        let result = self.flow.authorize(&auth_url).await?;

        let session =
            self.oauth_client.exchange_code_for_session(&result.code, &result.state).await?;

        self.store.save(&session).await.map_err(TokenManagerError::StoreError)?;

        info!("Interactive authorization completed");
        Ok(session)
    }
}

#[async_trait]
impl<C, S, F> TokenProvider for TokenManager<C, S, F>
where
    C: OAuthClientTrait + 'static,
    S: SessionStore + 'static,
    F: AuthorizationFlow + 'static,
{
    async fn get_valid_token(&self) -> Result<String, TokenManagerError> {
        self.get_valid_token().await
    }

    async fn invalidate_session(&self) -> Result<(), TokenManagerError> {
        self.store.clear().await.map_err(TokenManagerError::StoreError)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::token_manager.
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{MemorySessionStore, MockOAuthClient, ScriptedAuthorizationFlow};

    fn manager_with(
        client: MockOAuthClient,
        store: MemorySessionStore,
        flow: ScriptedAuthorizationFlow,
    ) -> TokenManager<MockOAuthClient, MemorySessionStore, ScriptedAuthorizationFlow> {
        TokenManager::new(Arc::new(client), Arc::new(store), Arc::new(flow))
    }

    fn valid_session() -> Session {
        Session {
            access_token: "cached".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now().timestamp() + 3600),
        }
    }

    fn expired_session() -> Session {
        Session {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now().timestamp() - 60),
        }
    }

    #[tokio::test]
    async fn valid_session_short_circuits_without_network() {
        let client = MockOAuthClient::new();
        let store = MemorySessionStore::with_session(valid_session());
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::denied("unused"));

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token, "cached");
        assert_eq!(manager.oauth_client.refresh_calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.oauth_client.exchange_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_session_is_refreshed_and_persisted() {
        let refreshed = Session {
            access_token: "fresh".to_string(),
            refresh_token: Some("refresh2".to_string()),
            expires_at: Some(Utc::now().timestamp() + 3590),
        };
        let client = MockOAuthClient::new().with_refresh_result(Ok(refreshed.clone()));
        let store = MemorySessionStore::with_session(expired_session());
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::denied("unused"));

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token, "fresh");
        assert_eq!(manager.oauth_client.refresh_calls.load(Ordering::SeqCst), 1);
        let persisted = manager.current_session().await.unwrap().unwrap();
        assert_eq!(persisted, refreshed);
    }

    #[tokio::test]
    async fn session_without_expiry_is_treated_as_expired() {
        let refreshed = Session {
            access_token: "fresh".to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now().timestamp() + 3590),
        };
        let client = MockOAuthClient::new().with_refresh_result(Ok(refreshed));
        let store = MemorySessionStore::with_session(Session {
            access_token: "no-expiry".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
        });
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::denied("unused"));

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token, "fresh");
        assert_eq!(manager.oauth_client.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_interactive_authorization() {
        let exchanged = Session {
            access_token: "T1".to_string(),
            refresh_token: Some("R1".to_string()),
            expires_at: Some(Utc::now().timestamp() + 3590),
        };
        let client = MockOAuthClient::new()
            .with_refresh_result(Err("refresh revoked".to_string()))
            .with_exchange_result(Ok(exchanged));
        let store = MemorySessionStore::with_session(expired_session());
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::success("abc"));

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token, "T1");
        assert_eq!(manager.oauth_client.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.oauth_client.exchange_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_session_enters_authorizing_and_persists_result() {
        let exchanged = Session {
            access_token: "T1".to_string(),
            refresh_token: Some("R1".to_string()),
            expires_at: Some(Utc::now().timestamp() + 3590),
        };
        let client = MockOAuthClient::new().with_exchange_result(Ok(exchanged.clone()));
        let store = MemorySessionStore::new();
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::success("abc"));

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token, "T1");
        let persisted = manager.current_session().await.unwrap().unwrap();
        assert_eq!(persisted, exchanged);
    }

    #[tokio::test]
    async fn denied_authorization_surfaces_and_persists_nothing() {
        let client = MockOAuthClient::new();
        let store = MemorySessionStore::new();
        let manager =
            manager_with(client, store, ScriptedAuthorizationFlow::denied("access_denied"));

        let result = manager.get_valid_token().await;

        assert!(matches!(result, Err(TokenManagerError::ProviderDenied(_))));
        assert!(manager.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn timeout_maps_to_timeout_error() {
        let client = MockOAuthClient::new();
        let store = MemorySessionStore::new();
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::timeout());

        let result = manager.get_valid_token().await;

        assert!(matches!(result, Err(TokenManagerError::Timeout)));
    }

    #[tokio::test]
    async fn end_to_end_authorization_against_a_mock_token_endpoint() {
        use wiremock::matchers::{body_string_contains, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use crate::auth::client::OAuthClient;
        use crate::auth::traits::{AuthorizationFlowError, AuthorizationResult};
        use crate::auth::types::OAuthConfig;

        /// Flow double that echoes the real state back from the auth URL,
        /// standing in for the browser round trip.
        struct EchoingFlow;

        #[async_trait]
        impl AuthorizationFlow for EchoingFlow {
            async fn authorize(
                &self,
                auth_url: &str,
            ) -> Result<AuthorizationResult, AuthorizationFlowError> {
                let state = auth_url
                    .split('?')
                    .nth(1)
                    .and_then(|q| q.split('&').find_map(|p| p.strip_prefix("state=")))
                    .ok_or_else(|| {
                        AuthorizationFlowError::Failed("no state in auth URL".to_string())
                    })?;
                Ok(AuthorizationResult { code: "e2e-code".to_string(), state: state.to_string() })
            }
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=e2e-code"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "E2E",
                "refresh_token": "E2E-R",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = OAuthConfig::new(
            "https://auth.example/authorize".to_string(),
            format!("{}/token", server.uri()),
            "client".to_string(),
            "key".to_string(),
            "http://localhost:7777/callback".to_string(),
        );
        let manager = TokenManager::new(
            Arc::new(OAuthClient::new(config)),
            Arc::new(MemorySessionStore::new()),
            Arc::new(EchoingFlow),
        );

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token, "E2E");
        let persisted = manager.current_session().await.unwrap().unwrap();
        assert_eq!(persisted.refresh_token, Some("E2E-R".to_string()));
        assert!(persisted.is_valid_at(Utc::now().timestamp()));
    }

    #[tokio::test]
    async fn logout_clears_persisted_session() {
        let client = MockOAuthClient::new();
        let store = MemorySessionStore::with_session(valid_session());
        let manager = manager_with(client, store, ScriptedAuthorizationFlow::denied("unused"));

        assert!(manager.is_authenticated().await);
        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated().await);
    }
}
