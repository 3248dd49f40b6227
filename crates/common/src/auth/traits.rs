//! Traits for OAuth, session storage, and authorization-flow operations
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (OAuth servers, the session file, the browser and
//! local callback listener). Each has exactly one production implementation
//! and one test double, selected by explicit configuration.

use async_trait::async_trait;
use vaultwatch_domain::Session;

use super::client::OAuthClientError;
use super::token_manager::TokenManagerError;

/// Trait for OAuth client operations
///
/// Abstracts OAuth HTTP flows to enable testing with mock implementations.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Generate authorization URL for browser-based login
    ///
    /// # Returns
    /// Tuple of (authorization_url, state) where state must be validated in
    /// callback
    ///
    /// # Errors
    /// Returns error if PKCE challenge generation fails
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError>;

    /// Exchange authorization code for a session
    ///
    /// # Errors
    /// Returns error if state mismatch, token exchange fails, or response
    /// parsing fails
    async fn exchange_code_for_session(
        &self,
        code: &str,
        state: &str,
    ) -> Result<Session, OAuthClientError>;

    /// Refresh the session using a refresh token
    ///
    /// # Errors
    /// Returns error if refresh fails or the token is invalid/revoked
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, OAuthClientError>;

    /// Get the configured redirect URI
    fn redirect_uri(&self) -> &str;
}

/// Trait for session persistence
///
/// The session file is the sole persisted artifact of authentication.
/// Production implementation writes a single JSON file; the test double
/// keeps the session in memory.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the session, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the write fails
    async fn save(&self, session: &Session) -> Result<(), String>;

    /// Load the persisted session, if any.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    async fn load(&self) -> Result<Option<Session>, String>;

    /// Delete the persisted session (logout / forced re-auth).
    ///
    /// Deleting an absent session is not an error.
    ///
    /// # Errors
    /// Returns error if deletion fails
    async fn clear(&self) -> Result<(), String>;
}

/// Outcome of one interactive authorization attempt.
///
/// Exactly one of code, error, or timeout terminates the wait; this type
/// carries the success arm, the error type below carries the other two.
#[derive(Debug, Clone)]
pub struct AuthorizationResult {
    /// Authorization code returned by the provider redirect.
    pub code: String,
    /// State parameter echoed back by the provider.
    pub state: String,
}

/// Failure of an interactive authorization attempt.
#[derive(Debug)]
pub enum AuthorizationFlowError {
    /// No code received within the bounded wait.
    Timeout,
    /// Provider redirected with an error parameter.
    Denied(String),
    /// Listener or browser failure.
    Failed(String),
}

impl std::fmt::Display for AuthorizationFlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "Authorization timed out"),
            Self::Denied(reason) => write!(f, "Authorization denied: {reason}"),
            Self::Failed(msg) => write!(f, "Authorization failed: {msg}"),
        }
    }
}

impl std::error::Error for AuthorizationFlowError {}

/// Trait for the interactive part of the authorization flow
///
/// The production implementation opens the system browser and runs the
/// local callback listener; the test double returns a scripted code without
/// any browser or network interaction.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Run one authorization attempt against the given URL and block until
    /// a code arrives, the provider reports an error, or the wait times out.
    ///
    /// # Errors
    /// Returns an [`AuthorizationFlowError`] describing which of the three
    /// terminal outcomes occurred
    async fn authorize(&self, auth_url: &str)
        -> Result<AuthorizationResult, AuthorizationFlowError>;
}

/// Capability consumed by the fetch pipeline: "give me a token I can use".
///
/// The token manager is the production implementation; tests substitute a
/// fixed-token double.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token, refreshing or re-authorizing
    /// as needed.
    ///
    /// # Errors
    /// Returns error if no token can be obtained
    async fn get_valid_token(&self) -> Result<String, TokenManagerError>;

    /// Invalidate the persisted session so the next call re-authorizes.
    ///
    /// # Errors
    /// Returns error if the session cannot be cleared
    async fn invalidate_session(&self) -> Result<(), TokenManagerError>;
}
