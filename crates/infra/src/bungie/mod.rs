//! Bungie.net Platform API adapter
//!
//! Resilient HTTP client for the three Platform operations the app needs:
//! profile fetch, player tag lookup, and the connectivity probe. Retry
//! behavior is keyed on the failure class of each attempt; see [`retry`].

pub mod client;
pub mod retry;

pub use client::BungieClient;
pub use retry::{BungieRetryPolicy, FetchFailure};
