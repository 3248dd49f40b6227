//! Local OAuth callback listener
//!
//! Short-lived HTTP server that receives the provider redirect during
//! interactive authorization. It serves exactly one `GET /callback`, hands
//! the query parameters to the waiting flow over a channel, renders a
//! static confirmation page, and tears the listener down. The port is also
//! released on timeout, so a second login attempt can bind it again.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use vaultwatch_common::auth::traits::{
    AuthorizationFlow, AuthorizationFlowError, AuthorizationResult,
};
use vaultwatch_domain::constants::{AUTHORIZE_TIMEOUT_SECS, REDIRECT_PORT};

/// Query parameters the provider may attach to the redirect.
///
/// Exactly one of `code` or `error` is present on a well-formed callback.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackData {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to bind callback listener: {0}")]
    Bind(#[from] std::io::Error),
    #[error("no authorization callback received within {0:?}")]
    Timeout(Duration),
    #[error("callback listener stopped before a request arrived")]
    Closed,
}

const SUCCESS_PAGE: &str = "<!DOCTYPE html><html><head><title>VaultWatch</title></head>\
<body style=\"font-family: sans-serif; text-align: center; margin-top: 4em;\">\
<h1>Authorization complete</h1>\
<p>You can close this window and return to VaultWatch.</p>\
</body></html>";

const DENIED_PAGE: &str = "<!DOCTYPE html><html><head><title>VaultWatch</title></head>\
<body style=\"font-family: sans-serif; text-align: center; margin-top: 4em;\">\
<h1>Authorization was not completed</h1>\
<p>You can close this window and retry from VaultWatch.</p>\
</body></html>";

async fn handle_callback(
    State(tx): State<mpsc::Sender<CallbackData>>,
    Query(data): Query<CallbackData>,
) -> Html<&'static str> {
    let page = if data.error.is_some() { DENIED_PAGE } else { SUCCESS_PAGE };
    // A second hit after the first has resolved the waiter is ignored.
    let _ = tx.try_send(data);
    Html(page)
}

/// Bound-but-not-yet-serving callback listener.
///
/// Binding is separated from waiting so the caller can confirm the port is
/// ours before opening the browser.
pub struct CallbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl CallbackReceiver {
    /// Bind the listener on `127.0.0.1:port`. Port 0 picks a free port.
    ///
    /// # Errors
    /// Returns [`CallbackError::Bind`] when the port is taken.
    pub async fn bind(port: u16) -> Result<Self, CallbackError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// The bound address, for building the redirect URI in tests.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until one callback arrives or the timeout elapses.
    ///
    /// The server task is aborted on every exit path, including timeout.
    ///
    /// # Errors
    /// Returns [`CallbackError::Timeout`] when no redirect arrives in time.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<CallbackData, CallbackError> {
        let (tx, mut rx) = mpsc::channel::<CallbackData>(1);

        let app = Router::new().route("/callback", get(handle_callback)).with_state(tx);

        info!(addr = %self.addr, "Waiting for OAuth callback");
        let server = tokio::spawn(async move {
            let _ = axum::serve(self.listener, app).await;
        });

        let outcome = tokio::select! {
            received = rx.recv() => received.ok_or(CallbackError::Closed),
            () = tokio::time::sleep(timeout) => Err(CallbackError::Timeout(timeout)),
        };

        server.abort();
        outcome
    }
}

/// Production [`AuthorizationFlow`]: system browser plus local listener.
pub struct BrowserAuthorizationFlow {
    port: u16,
    timeout: Duration,
}

impl BrowserAuthorizationFlow {
    #[must_use]
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

impl Default for BrowserAuthorizationFlow {
    fn default() -> Self {
        Self::new(REDIRECT_PORT, Duration::from_secs(AUTHORIZE_TIMEOUT_SECS))
    }
}

#[async_trait]
impl AuthorizationFlow for BrowserAuthorizationFlow {
    async fn authorize(
        &self,
        auth_url: &str,
    ) -> Result<AuthorizationResult, AuthorizationFlowError> {
        // Listener goes up before the browser so the redirect cannot race it.
        let receiver = CallbackReceiver::bind(self.port)
            .await
            .map_err(|e| AuthorizationFlowError::Failed(e.to_string()))?;

        if let Err(e) = webbrowser::open(auth_url) {
            // The user can still paste the URL by hand; keep waiting.
            warn!(error = %e, url = auth_url, "Could not open browser, open the URL manually");
        }

        let data = receiver.wait_for_code(self.timeout).await.map_err(|e| match e {
            CallbackError::Timeout(_) => AuthorizationFlowError::Timeout,
            other => AuthorizationFlowError::Failed(other.to_string()),
        })?;

        if let Some(error) = data.error {
            let reason = data.error_description.unwrap_or(error);
            return Err(AuthorizationFlowError::Denied(reason));
        }

        match (data.code, data.state) {
            (Some(code), Some(state)) => Ok(AuthorizationResult { code, state }),
            _ => Err(AuthorizationFlowError::Failed(
                "callback arrived without code or state".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Integration-style tests driving the listener over loopback HTTP.
    use super::*;

    #[tokio::test]
    async fn callback_with_code_resolves_the_waiter() {
        let receiver = CallbackReceiver::bind(0).await.unwrap();
        let addr = receiver.local_addr();

        let wait = tokio::spawn(receiver.wait_for_code(Duration::from_secs(5)));

        let url = format!("http://{addr}/callback?code=auth-code&state=xyz");
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(body.contains("Authorization complete"));

        let data = wait.await.unwrap().unwrap();
        assert_eq!(data.code.as_deref(), Some("auth-code"));
        assert_eq!(data.state.as_deref(), Some("xyz"));
        assert!(data.error.is_none());
    }

    #[tokio::test]
    async fn callback_with_error_carries_the_denial() {
        let receiver = CallbackReceiver::bind(0).await.unwrap();
        let addr = receiver.local_addr();

        let wait = tokio::spawn(receiver.wait_for_code(Duration::from_secs(5)));

        let url = format!(
            "http://{addr}/callback?error=access_denied&error_description=user%20said%20no&state=xyz"
        );
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(body.contains("not completed"));

        let data = wait.await.unwrap().unwrap();
        assert!(data.code.is_none());
        assert_eq!(data.error.as_deref(), Some("access_denied"));
        assert_eq!(data.error_description.as_deref(), Some("user said no"));
    }

    #[tokio::test]
    async fn timeout_releases_the_port() {
        let receiver = CallbackReceiver::bind(0).await.unwrap();
        let addr = receiver.local_addr();

        let result = receiver.wait_for_code(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(CallbackError::Timeout(_))));

        // The listener is gone, so the same port binds again.
        let rebound = CallbackReceiver::bind(addr.port()).await;
        assert!(rebound.is_ok());
    }
}
