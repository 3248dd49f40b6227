//! Domain types and models

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Session
// ============================================================================

/// Persisted OAuth session.
///
/// Sole content of the session file. Created on first successful
/// authorization, overwritten on every refresh, deleted on logout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Epoch seconds. A session lacking this field is treated as expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Session {
    /// A session is valid iff `now < expires_at`. Missing `expires_at`
    /// fails safe to expired.
    pub fn is_valid_at(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if now < expires_at)
    }
}

// ============================================================================
// Cached profile entry
// ============================================================================

/// Disk cache entry wrapping the last successfully fetched profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedProfileEntry {
    pub profile: serde_json::Value,
    /// Epoch seconds at which the profile was fetched.
    pub cached_at: i64,
    pub cache_version: String,
}

impl CachedProfileEntry {
    /// Fresh iff `now - cached_at` is within `ttl_secs`.
    pub fn is_fresh_at(&self, now: i64, ttl_secs: i64) -> bool {
        now - self.cached_at <= ttl_secs
    }
}

// ============================================================================
// Membership identity
// ============================================================================

/// Platform discriminant of a Destiny membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum MembershipType {
    Xbox,
    Psn,
    Steam,
    Blizzard,
    Stadia,
    Egs,
}

impl MembershipType {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Xbox => 1,
            Self::Psn => 2,
            Self::Steam => 3,
            Self::Blizzard => 4,
            Self::Stadia => 5,
            Self::Egs => 6,
        }
    }
}

impl TryFrom<i32> for MembershipType {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Xbox),
            2 => Ok(Self::Psn),
            3 => Ok(Self::Steam),
            4 => Ok(Self::Blizzard),
            5 => Ok(Self::Stadia),
            6 => Ok(Self::Egs),
            other => Err(format!("unknown membership type: {other}")),
        }
    }
}

impl From<MembershipType> for i32 {
    fn from(value: MembershipType) -> Self {
        value.as_i32()
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Xbox => "Xbox",
            Self::Psn => "PSN",
            Self::Steam => "Steam",
            Self::Blizzard => "Blizzard",
            Self::Stadia => "Stadia",
            Self::Egs => "Epic Games",
        };
        write!(f, "{name}")
    }
}

/// Compound player identifier: platform plus per-platform account id.
///
/// Resolved once via a player-tag lookup and threaded through fetch calls;
/// never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipIdentity {
    pub membership_type: MembershipType,
    pub membership_id: String,
}

// ============================================================================
// Profile response shapes
// ============================================================================
//
// Only the slices of the profile payload that extraction reads are typed.
// Everything else rides along as opaque JSON.

/// A single objective attached to an item instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemObjective {
    #[serde(default)]
    pub progress: u32,
    #[serde(rename = "completionValue", default)]
    pub completion_value: u32,
}

/// Objective list for one item instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemObjectiveSet {
    #[serde(default)]
    pub objectives: Vec<ItemObjective>,
}

/// Per-item-instance component data, keyed by item instance id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemComponents {
    #[serde(default)]
    pub instances: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub objectives: HashMap<String, ItemObjectiveSet>,
}

/// One item in the profile-wide inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "itemHash", default)]
    pub item_hash: u64,
    #[serde(rename = "itemInstanceId", default, skip_serializing_if = "Option::is_none")]
    pub item_instance_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Profile-wide inventory component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInventory {
    #[serde(default)]
    pub data: ProfileInventoryData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInventoryData {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

/// The `Response` object of a profile payload, reduced to the components
/// extraction consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(rename = "itemComponents", default)]
    pub item_components: ItemComponents,
    #[serde(rename = "profileInventory", default)]
    pub profile_inventory: ProfileInventory,
}

// ============================================================================
// Progression records
// ============================================================================

/// Progress toward one multi-step objective (pattern or catalyst).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRecord {
    pub item_instance_id: String,
    pub progress: u32,
    pub needed: u32,
    pub percent: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_without_expiry_is_expired() {
        let session = Session {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(!session.is_valid_at(0));
    }

    #[test]
    fn session_validity_is_strict() {
        let session = Session {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: Some(100),
        };
        assert!(session.is_valid_at(99));
        assert!(!session.is_valid_at(100));
        assert!(!session.is_valid_at(101));
    }

    #[test]
    fn cached_entry_freshness_window() {
        let entry = CachedProfileEntry {
            profile: serde_json::json!({}),
            cached_at: 1_000,
            cache_version: "1.0".to_string(),
        };
        assert!(entry.is_fresh_at(1_000 + 3_600, 86_400));
        assert!(!entry.is_fresh_at(1_000 + 90_000, 86_400));
    }

    #[test]
    fn membership_type_round_trips_through_wire_value() {
        for value in 1..=6 {
            let parsed = MembershipType::try_from(value).unwrap();
            assert_eq!(parsed.as_i32(), value);
        }
        assert!(MembershipType::try_from(7).is_err());
    }

    #[test]
    fn session_json_uses_snake_case_field_names() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: Some(42),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert_eq!(json["expires_at"], 42);
    }
}
