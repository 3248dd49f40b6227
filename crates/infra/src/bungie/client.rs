//! Resilient Bungie Platform client
//!
//! One client instance serves every Platform call site. All outbound
//! requests pass through the shared pacer; the profile fetch additionally
//! runs the classify-and-retry loop from [`super::retry`] and writes each
//! successful payload to the profile cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use vaultwatch_common::auth::token_manager::TokenManagerError;
use vaultwatch_common::resilience::retry::honor_decision;
use vaultwatch_common::{RequestPacer, RetryPolicy, TokenProvider};
use vaultwatch_core::ProfileSource;
use vaultwatch_domain::constants::{
    DEFAULT_PROFILE_COMPONENTS, DEFAULT_RETRY_ATTEMPTS, HEALTH_CHECK_TIMEOUT_SECS,
    REQUEST_TIMEOUT_SECS, USER_AGENT,
};
use vaultwatch_domain::{MembershipIdentity, MembershipType, Result, VaultWatchError};

use super::retry::{retry_after_wait, BungieRetryPolicy, FetchFailure};
use crate::cache::ProfileCache;

const API_KEY_HEADER: &str = "X-API-Key";

/// Bungie Platform API client.
pub struct BungieClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    tokens: Arc<dyn TokenProvider>,
    pacer: Arc<RequestPacer>,
    cache: Arc<ProfileCache>,
    policy: Box<dyn RetryPolicy<FetchFailure> + Send + Sync>,
    max_attempts: u32,
}

impl BungieClient {
    /// Build a client against the given Platform base URL.
    ///
    /// # Errors
    /// Returns [`VaultWatchError::Internal`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        pacer: Arc<RequestPacer>,
        cache: Arc<ProfileCache>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VaultWatchError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            tokens,
            pacer,
            cache,
            policy: Box::new(BungieRetryPolicy),
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Replace the backoff schedule, used by tests to avoid real sleeps.
    #[must_use]
    pub fn with_retry_policy(
        mut self,
        policy: Box<dyn RetryPolicy<FetchFailure> + Send + Sync>,
    ) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Fetch a profile, retrying transient failures.
    ///
    /// A missing token fails immediately; everything else follows the
    /// per-class backoff schedule until the attempt budget runs out. The
    /// successful payload is cached before it is returned.
    ///
    /// # Errors
    /// Returns the domain error of the last failed attempt.
    #[instrument(skip(self), fields(membership_id = %membership.membership_id))]
    pub async fn fetch_profile(
        &self,
        membership: &MembershipIdentity,
        components: Option<&str>,
    ) -> Result<serde_json::Value> {
        let components = components.unwrap_or(DEFAULT_PROFILE_COMPONENTS);

        for attempt in 0..self.max_attempts {
            self.pacer.acquire().await;

            match self.try_fetch(membership, components).await {
                Ok(profile) => {
                    if let Err(e) = self.cache.store(&profile).await {
                        warn!(error = %e, "Could not cache fetched profile");
                    }
                    return Ok(profile);
                }
                Err(FetchFailure::Fatal(e)) => return Err(e),
                Err(failure) => {
                    if matches!(failure, FetchFailure::Unauthorized) {
                        info!("Profile request rejected, clearing session before retry");
                        if let Err(e) = self.tokens.invalidate_session().await {
                            warn!(error = %e, "Could not clear session after 401");
                        }
                    }

                    // The policy never sees the final attempt.
                    if attempt + 1 >= self.max_attempts {
                        return Err(failure.into_error());
                    }

                    debug!(attempt, failure = ?failure, "Profile fetch attempt failed");
                    let decision = self.policy.decide(&failure, attempt);
                    if !honor_decision(decision).await {
                        return Err(failure.into_error());
                    }
                }
            }
        }

        Err(VaultWatchError::Internal("fetch loop exited without a result".to_string()))
    }

    async fn try_fetch(
        &self,
        membership: &MembershipIdentity,
        components: &str,
    ) -> std::result::Result<serde_json::Value, FetchFailure> {
        let token = self.tokens.get_valid_token().await.map_err(|e| match e {
            TokenManagerError::Timeout => {
                FetchFailure::Fatal(VaultWatchError::Timeout("authorization timed out".to_string()))
            }
            other => FetchFailure::Fatal(VaultWatchError::Auth(other.to_string())),
        })?;

        let url = format!(
            "{}/Destiny2/{}/Profile/{}/",
            self.base_url,
            membership.membership_type.as_i32(),
            membership.membership_id
        );

        let response = self
            .http
            .get(&url)
            .query(&[("components", components)])
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {
                let body: serde_json::Value = response.json().await.map_err(|e| {
                    FetchFailure::Fatal(VaultWatchError::Validation(format!(
                        "profile response is not JSON: {e}"
                    )))
                })?;
                validate_profile(body)
            }
            401 => Err(FetchFailure::Unauthorized),
            429 => {
                let retry_after = retry_after_wait(
                    response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok()),
                );
                Err(FetchFailure::Throttled { retry_after })
            }
            503 => Err(FetchFailure::Unavailable),
            _ => Err(FetchFailure::Fatal(VaultWatchError::Network(format!(
                "profile request failed with status {status}"
            )))),
        }
    }

    /// Resolve a `Name#1234` tag to a membership.
    ///
    /// # Errors
    /// Returns [`VaultWatchError::Validation`] for a malformed tag and
    /// [`VaultWatchError::NotFound`] when no player matches.
    #[instrument(skip(self))]
    pub async fn search_player(&self, bungie_tag: &str) -> Result<MembershipIdentity> {
        let (name, code) = parse_bungie_tag(bungie_tag)?;

        self.pacer.acquire().await;

        let url = format!(
            "{}/Destiny2/SearchDestinyPlayer/-1/{}/",
            self.base_url,
            urlencoding::encode(name)
        );

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| VaultWatchError::Network(format!("player search failed: {e}")))?;

        if !response.status().is_success() {
            return Err(VaultWatchError::Network(format!(
                "player search failed with status {}",
                response.status()
            )));
        }

        let body: PlayerSearchResponse = response
            .json()
            .await
            .map_err(|e| VaultWatchError::Validation(format!("unexpected search payload: {e}")))?;

        let entry = body
            .response
            .into_iter()
            .find(|entry| entry.display_name_code == Some(code))
            .ok_or_else(|| VaultWatchError::NotFound(format!("no player matching {bungie_tag}")))?;

        let membership_type =
            MembershipType::try_from(entry.membership_type).map_err(VaultWatchError::Validation)?;
        Ok(MembershipIdentity { membership_type, membership_id: entry.membership_id })
    }

    /// Probe Platform reachability without touching auth.
    ///
    /// # Errors
    /// Returns [`VaultWatchError::Network`] or [`VaultWatchError::Timeout`]
    /// when the manifest endpoint cannot be reached.
    pub async fn check_api_health(&self) -> Result<()> {
        self.pacer.acquire().await;

        let url = format!("{}/Destiny2/Manifest/", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VaultWatchError::Timeout("health probe timed out".to_string())
                } else {
                    VaultWatchError::Network(format!("health probe failed: {e}"))
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(VaultWatchError::Network(format!(
                "API reported status {} on the manifest endpoint",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl ProfileSource for BungieClient {
    async fn fetch_profile(
        &self,
        membership: &MembershipIdentity,
        components: Option<&str>,
    ) -> Result<serde_json::Value> {
        BungieClient::fetch_profile(self, membership, components).await
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::TimedOut
    } else {
        FetchFailure::Connection(format!("could not reach the API: {e}"))
    }
}

/// A profile payload must carry a top-level `Response` object. Missing
/// component sub-keys are the extraction layer's concern, not a fetch
/// failure.
fn validate_profile(body: serde_json::Value) -> std::result::Result<serde_json::Value, FetchFailure> {
    if body.get("Response").map(serde_json::Value::is_object) == Some(true) {
        Ok(body)
    } else {
        Err(FetchFailure::Fatal(VaultWatchError::Validation(
            "profile response is missing the Response object".to_string(),
        )))
    }
}

fn parse_bungie_tag(tag: &str) -> Result<(&str, i32)> {
    fn malformed(tag: &str) -> VaultWatchError {
        VaultWatchError::Validation(format!("player tag must look like Name#1234, got {tag:?}"))
    }

    let (name, code) = tag.split_once('#').ok_or_else(|| malformed(tag))?;
    if name.is_empty() {
        return Err(malformed(tag));
    }
    let code: i32 = code.parse().map_err(|_| malformed(tag))?;
    Ok((name, code))
}

#[derive(Debug, Deserialize)]
struct PlayerSearchEntry {
    #[serde(rename = "membershipType")]
    membership_type: i32,
    #[serde(rename = "membershipId")]
    membership_id: String,
    #[serde(rename = "bungieGlobalDisplayNameCode", default)]
    display_name_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct PlayerSearchResponse {
    #[serde(rename = "Response", default)]
    response: Vec<PlayerSearchEntry>,
}
