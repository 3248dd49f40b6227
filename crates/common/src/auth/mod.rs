//! OAuth 2.0 + PKCE authentication core
//!
//! Unified OAuth 2.0 implementation with PKCE support for the Bungie.net
//! desktop flow. No client secret exists anywhere in this module; the flow
//! is PKCE-only (RFC 7636).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   TokenManager   │  Lifecycle state machine (the core)
//! └────────┬─────────┘
//!          │
//!          ├──► OAuthClient         (HTTP: code exchange, refresh)
//!          ├──► SessionStore        (persisted session file)
//!          ├──► AuthorizationFlow   (browser + local callback listener)
//!          │
//!          └──► PKCE utilities      (challenge generation)
//! ```
//!
//! `TokenManager` implements [`TokenProvider`], the capability the fetch
//! pipeline consumes. Each seam has one production implementation and one
//! test double (see [`crate::testing`]).
//!
//! # Module Organization
//!
//! - **[`types`]**: Wire types (`TokenResponse`, `OAuthConfig`, provider errors)
//! - **[`pkce`]**: PKCE challenge generation and validation
//! - **[`client`]**: OAuth HTTP client for authorization and token exchange
//! - **[`token_manager`]**: Session lifecycle state machine
//! - **[`traits`]**: DI seams (`SessionStore`, `AuthorizationFlow`, `TokenProvider`)

pub mod client;
pub mod pkce;
pub mod token_manager;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use client::{OAuthClient, OAuthClientError};
pub use pkce::PkceChallenge;
// Re-export PKCE utility functions
pub use pkce::{generate_code_challenge, generate_code_verifier, generate_state, validate_state};
pub use token_manager::{TokenManager, TokenManagerError, TEST_MODE_TOKEN};
pub use traits::{
    AuthorizationFlow, AuthorizationFlowError, AuthorizationResult, OAuthClientTrait, SessionStore,
    TokenProvider,
};
pub use types::{OAuthConfig, OAuthProviderError, TokenResponse};
