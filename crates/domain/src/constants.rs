//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Bungie API endpoints
pub const BUNGIE_AUTHORIZE_URL: &str = "https://www.bungie.net/en/OAuth/Authorize";
pub const BUNGIE_TOKEN_URL: &str = "https://www.bungie.net/Platform/App/OAuth/Token/";
pub const BUNGIE_PLATFORM_URL: &str = "https://www.bungie.net/Platform";

// OAuth redirect target; must exactly match the registered application
pub const REDIRECT_PORT: u16 = 7777;
pub const REDIRECT_URI: &str = "http://localhost:7777/callback";

// Token lifecycle
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 10;
pub const AUTHORIZE_TIMEOUT_SECS: u64 = 180;

// Outbound request pacing and limits
pub const MIN_REQUEST_INTERVAL_MS: u64 = 100;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const RATE_LIMIT_DEFAULT_WAIT_SECS: u64 = 60;

// Profile cache
pub const PROFILE_CACHE_TTL_SECS: i64 = 24 * 60 * 60;
pub const CACHE_VERSION: &str = "1.0";

// Identification sent with every outbound request
pub const USER_AGENT: &str = "VaultWatch/1.0";

/// Default profile components requested from the profile endpoint when the
/// caller does not override them.
pub const DEFAULT_PROFILE_COMPONENTS: &str = "100,102,103,104,200,201,202,205,300,301,302,304,305,306,307,308,309,310,311,312,313,315,316,317,318";
