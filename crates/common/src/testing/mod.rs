//! Test doubles for the auth seams
//!
//! In-memory implementations of [`SessionStore`], [`OAuthClientTrait`], and
//! [`AuthorizationFlow`] for deterministic tests without keychains,
//! browsers, or network access. Also usable by downstream crates' tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use vaultwatch_domain::Session;

use crate::auth::client::OAuthClientError;
use crate::auth::traits::{
    AuthorizationFlow, AuthorizationFlowError, AuthorizationResult, OAuthClientTrait, SessionStore,
};
use crate::auth::types::OAuthProviderError;

/// State value used by the scripted client/flow pair.
pub const SCRIPTED_STATE: &str = "scripted-state";

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing session.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self { session: Mutex::new(Some(session)) }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &Session) -> Result<(), String> {
        let mut guard = self.session.lock().map_err(|e| e.to_string())?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>, String> {
        let guard = self.session.lock().map_err(|e| e.to_string())?;
        Ok(guard.clone())
    }

    async fn clear(&self) -> Result<(), String> {
        let mut guard = self.session.lock().map_err(|e| e.to_string())?;
        *guard = None;
        Ok(())
    }
}

/// Scripted OAuth client with call counters.
///
/// Refresh and exchange results are configured up front; every call is
/// counted so tests can assert which lifecycle paths ran.
#[derive(Debug)]
pub struct MockOAuthClient {
    pub refresh_calls: AtomicU32,
    pub exchange_calls: AtomicU32,
    pub authorize_url_calls: AtomicU32,
    refresh_result: Mutex<Result<Session, String>>,
    exchange_result: Mutex<Result<Session, String>>,
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOAuthClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            refresh_calls: AtomicU32::new(0),
            exchange_calls: AtomicU32::new(0),
            authorize_url_calls: AtomicU32::new(0),
            refresh_result: Mutex::new(Err("mock refresh not configured".to_string())),
            exchange_result: Mutex::new(Err("mock exchange not configured".to_string())),
        }
    }

    #[must_use]
    pub fn with_refresh_result(self, result: Result<Session, String>) -> Self {
        if let Ok(mut guard) = self.refresh_result.lock() {
            *guard = result;
        }
        self
    }

    #[must_use]
    pub fn with_exchange_result(self, result: Result<Session, String>) -> Self {
        if let Ok(mut guard) = self.exchange_result.lock() {
            *guard = result;
        }
        self
    }

    fn take_result(
        slot: &Mutex<Result<Session, String>>,
    ) -> Result<Session, OAuthClientError> {
        let guard = slot.lock().map_err(|e| OAuthClientError::ParseError(e.to_string()))?;
        guard.clone().map_err(|msg| {
            OAuthClientError::Provider(OAuthProviderError { error: msg, error_description: None })
        })
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        self.authorize_url_calls.fetch_add(1, Ordering::SeqCst);
        Ok((
            format!("https://auth.example/authorize?state={SCRIPTED_STATE}"),
            SCRIPTED_STATE.to_string(),
        ))
    }

    async fn exchange_code_for_session(
        &self,
        _code: &str,
        _state: &str,
    ) -> Result<Session, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        Self::take_result(&self.exchange_result)
    }

    async fn refresh_session(&self, _refresh_token: &str) -> Result<Session, OAuthClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Self::take_result(&self.refresh_result)
    }

    fn redirect_uri(&self) -> &str {
        "http://localhost:7777/callback"
    }
}

/// Scripted authorization flow: immediately resolves with a fixed outcome.
#[derive(Debug, Clone)]
pub enum ScriptedAuthorizationFlow {
    Success { code: String },
    Denied { reason: String },
    Timeout,
}

impl ScriptedAuthorizationFlow {
    #[must_use]
    pub fn success(code: &str) -> Self {
        Self::Success { code: code.to_string() }
    }

    #[must_use]
    pub fn denied(reason: &str) -> Self {
        Self::Denied { reason: reason.to_string() }
    }

    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }
}

#[async_trait]
impl AuthorizationFlow for ScriptedAuthorizationFlow {
    async fn authorize(
        &self,
        _auth_url: &str,
    ) -> Result<AuthorizationResult, AuthorizationFlowError> {
        match self {
            Self::Success { code } => Ok(AuthorizationResult {
                code: code.clone(),
                state: SCRIPTED_STATE.to_string(),
            }),
            Self::Denied { reason } => Err(AuthorizationFlowError::Denied(reason.clone())),
            Self::Timeout => Err(AuthorizationFlowError::Timeout),
        }
    }
}

/// Fixed-token provider for fetch pipeline tests.
#[derive(Debug)]
pub struct StaticTokenProvider {
    token: Mutex<Option<String>>,
    pub invalidations: AtomicU32,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_string())), invalidations: AtomicU32::new(0) }
    }

    /// Provider that always fails, simulating an unauthenticated state.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { token: Mutex::new(None), invalidations: AtomicU32::new(0) }
    }
}

#[async_trait]
impl crate::auth::traits::TokenProvider for StaticTokenProvider {
    async fn get_valid_token(&self) -> Result<String, crate::auth::TokenManagerError> {
        let guard = self
            .token
            .lock()
            .map_err(|e| crate::auth::TokenManagerError::StoreError(e.to_string()))?;
        guard.clone().ok_or(crate::auth::TokenManagerError::NotAuthenticated)
    }

    async fn invalidate_session(&self) -> Result<(), crate::auth::TokenManagerError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
