//! Modular common utilities shared across VaultWatch crates.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards to ensure
//! reliability across all VaultWatch components.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    AuthorizationFlow, AuthorizationResult, OAuthClient, OAuthClientError, OAuthConfig,
    PkceChallenge, SessionStore, TokenManager, TokenManagerError, TokenProvider,
};
pub use resilience::{Clock, MockClock, RequestPacer, RetryDecision, RetryPolicy, SystemClock};
