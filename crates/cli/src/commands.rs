//! Command implementations
//!
//! Each command builds the full adapter stack from the environment, runs
//! one operation, and prints a human-readable result.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;
use vaultwatch_common::{Clock, OAuthClient, OAuthConfig, RequestPacer, SystemClock, TokenManager, TokenProvider};
use vaultwatch_core::ProgressReport;
use vaultwatch_domain::constants::{BUNGIE_PLATFORM_URL, MIN_REQUEST_INTERVAL_MS};
use vaultwatch_domain::ObjectiveRecord;
use vaultwatch_infra::{
    load_config, BrowserAuthorizationFlow, BungieClient, FileSessionStore, ProfileCache,
};

struct App {
    manager: Arc<TokenManager<OAuthClient, FileSessionStore, BrowserAuthorizationFlow>>,
    client: BungieClient,
    cache: Arc<ProfileCache>,
}

fn build() -> anyhow::Result<App> {
    let config = load_config()?;

    let oauth = Arc::new(OAuthClient::new(OAuthConfig::bungie(
        config.client_id.clone(),
        config.api_key.clone(),
    )));
    let store = Arc::new(FileSessionStore::new(config.session_path()));
    let flow = Arc::new(BrowserAuthorizationFlow::default());
    let manager = Arc::new(TokenManager::new(oauth, store, flow));

    let cache = Arc::new(ProfileCache::new(config.profile_cache_path()));
    let pacer = Arc::new(RequestPacer::new(Duration::from_millis(MIN_REQUEST_INTERVAL_MS)));
    let tokens: Arc<dyn TokenProvider> = manager.clone();
    let client =
        BungieClient::new(BUNGIE_PLATFORM_URL, config.api_key, tokens, pacer, cache.clone())?;

    Ok(App { manager, client, cache })
}

pub async fn login() -> anyhow::Result<()> {
    let app = build()?;

    app.manager.get_valid_token().await.context("authorization failed")?;

    match app.manager.current_session().await? {
        Some(session) => {
            println!("Authorized with Bungie.net.");
            if let Some(expires_at) = session.expires_at {
                println!("Session valid until {}.", format_timestamp(expires_at));
            }
        }
        None => println!("Authorized (test mode, no session persisted)."),
    }
    Ok(())
}

pub async fn fetch(
    tag: &str,
    components: Option<&str>,
    exotic_hashes: &[u64],
) -> anyhow::Result<()> {
    let app = build()?;

    let identity = app.client.search_player(tag).await?;
    println!("{tag} resolved to {} / {}", identity.membership_type, identity.membership_id);

    let profile = match app.client.fetch_profile(&identity, components).await {
        Ok(profile) => profile,
        Err(e) => {
            // A stale cache still beats nothing when the API is down.
            warn!(error = %e, "Live fetch failed, falling back to the cache");
            match app.cache.entry().await? {
                Some(entry) => {
                    println!("Using cached profile from {}.", format_timestamp(entry.cached_at));
                    entry.profile
                }
                None => return Err(e.into()),
            }
        }
    };

    let hashes: HashSet<u64> = exotic_hashes.iter().copied().collect();
    let report = ProgressReport::from_profile(&profile, &hashes);
    print_report(&report);
    Ok(())
}

pub async fn status() -> anyhow::Result<()> {
    let app = build()?;
    let now = SystemClock.epoch_secs();

    match app.manager.current_session().await? {
        Some(session) if session.is_valid_at(now) => {
            let until = session.expires_at.map_or_else(String::new, format_timestamp);
            println!("Session: valid until {until}");
        }
        Some(_) => println!("Session: expired, next fetch will refresh or re-authorize"),
        None => println!("Session: none, run `vaultwatch login`"),
    }

    match app.cache.entry().await? {
        Some(entry) => println!("Cache:   profile from {}", format_timestamp(entry.cached_at)),
        None => println!("Cache:   empty"),
    }

    match app.client.check_api_health().await {
        Ok(()) => println!("API:     reachable"),
        Err(e) => println!("API:     unreachable ({e})"),
    }
    Ok(())
}

pub async fn logout() -> anyhow::Result<()> {
    let app = build()?;
    app.manager.logout().await.context("logout failed")?;
    println!("Logged out.");
    Ok(())
}

fn print_report(report: &ProgressReport) {
    println!("Red borders ({}):", report.red_borders.len());
    for record in &report.red_borders {
        print_record(record);
    }

    println!("Catalysts ({}):", report.catalysts.len());
    for record in &report.catalysts {
        print_record(record);
    }

    println!("Exotics owned ({}):", report.exotics.len());
    for item in &report.exotics {
        let instance = item.item_instance_id.as_deref().unwrap_or("-");
        println!("  {:>12}  instance {}  x{}", item.item_hash, instance, item.quantity);
    }
}

fn print_record(record: &ObjectiveRecord) {
    println!(
        "  {:>20}  {}/{} ({}%)",
        record.item_instance_id, record.progress, record.needed, record.percent
    );
}

fn format_timestamp(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map_or_else(|| format!("epoch {epoch_secs}"), |dt| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn unrepresentable_timestamps_fall_back_to_epoch_seconds() {
        assert_eq!(format_timestamp(i64::MAX), format!("epoch {}", i64::MAX));
    }
}
