//! # VaultWatch Infrastructure
//!
//! Adapters binding the pure layers to the outside world:
//! - File-backed session store and profile cache
//! - Local OAuth callback listener and browser launch
//! - Resilient Bungie API client (profile fetch, player lookup, health probe)
//! - Environment-based configuration loading
//!
//! Everything here implements a trait defined in `vaultwatch-common` or
//! `vaultwatch-core`; nothing above this crate touches the network or disk.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod bungie;
pub mod cache;
pub mod callback;
pub mod config;
pub mod session;

pub use bungie::{BungieClient, BungieRetryPolicy, FetchFailure};
pub use cache::ProfileCache;
pub use callback::{BrowserAuthorizationFlow, CallbackData, CallbackError, CallbackReceiver};
pub use config::load_config;
pub use session::FileSessionStore;
