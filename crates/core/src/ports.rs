//! Port interfaces for profile acquisition
//!
//! These traits define the boundary between extraction logic and the
//! infrastructure that fetches profiles from the network or cache.

use async_trait::async_trait;
use vaultwatch_domain::{MembershipIdentity, Result};

/// Trait for obtaining a player's raw profile payload
///
/// The production implementation is the resilient Bungie fetch pipeline;
/// tests substitute a fixture-backed source.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile for the given membership.
    ///
    /// `components` overrides the default component set when present; the
    /// string is passed through to the API verbatim.
    async fn fetch_profile(
        &self,
        membership: &MembershipIdentity,
        components: Option<&str>,
    ) -> Result<serde_json::Value>;
}
