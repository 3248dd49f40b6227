//! Extraction layer
//!
//! Pure functions mapping a raw profile payload to progression facts:
//! pattern (red border) completion, catalyst completion, and owned exotic
//! items. Consumes profile JSON, produces plain records; no I/O.
//!
//! An objective "counts" when its `completionValue` is greater than 1,
//! which is what distinguishes multi-step pattern/catalyst objectives from
//! binary flags in the item component data.

use std::collections::HashSet;

use tracing::debug;
use vaultwatch_domain::{InventoryItem, ItemObjective, ObjectiveRecord, ProfileData};

/// Aggregate counts for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub red_borders: Vec<ObjectiveRecord>,
    pub catalysts: Vec<ObjectiveRecord>,
    pub exotics: Vec<InventoryItem>,
}

impl ProgressReport {
    /// Build the full report from one profile payload.
    #[must_use]
    pub fn from_profile(profile: &serde_json::Value, exotic_hashes: &HashSet<u64>) -> Self {
        Self {
            red_borders: extract_red_borders(profile),
            catalysts: extract_catalysts(profile),
            exotics: extract_exotics(profile, exotic_hashes),
        }
    }
}

fn profile_data(profile: &serde_json::Value) -> ProfileData {
    let response = profile.get("Response").cloned().unwrap_or_default();
    match serde_json::from_value(response) {
        Ok(data) => data,
        Err(err) => {
            debug!(error = %err, "Profile components did not match expected shape");
            ProfileData::default()
        }
    }
}

fn record_for(item_instance_id: &str, objective: &ItemObjective) -> ObjectiveRecord {
    let progress = objective.progress;
    let needed = objective.completion_value;
    let percent = if needed > 0 { progress.saturating_mul(100) / needed } else { 0 };
    ObjectiveRecord {
        item_instance_id: item_instance_id.to_string(),
        progress,
        needed,
        percent,
    }
}

/// Extract red border (pattern) progress from a profile payload.
///
/// For each instanced item, the first objective with a multi-step
/// completion value yields one record.
#[must_use]
pub fn extract_red_borders(profile: &serde_json::Value) -> Vec<ObjectiveRecord> {
    let data = profile_data(profile);

    let mut records: Vec<ObjectiveRecord> = data
        .item_components
        .instances
        .keys()
        .filter_map(|item_id| {
            let objectives = data
                .item_components
                .objectives
                .get(item_id)
                .map(|set| set.objectives.as_slice())
                .unwrap_or_default();
            objectives
                .iter()
                .find(|obj| obj.completion_value > 1)
                .map(|obj| record_for(item_id, obj))
        })
        .collect();

    // Stable output regardless of map iteration order
    records.sort_by(|a, b| a.item_instance_id.cmp(&b.item_instance_id));
    records
}

/// Extract catalyst progress from a profile payload.
///
/// Unlike red borders, every qualifying objective on an item yields its
/// own record.
#[must_use]
pub fn extract_catalysts(profile: &serde_json::Value) -> Vec<ObjectiveRecord> {
    let data = profile_data(profile);

    let mut records: Vec<ObjectiveRecord> = data
        .item_components
        .instances
        .keys()
        .flat_map(|item_id| {
            let objectives = data
                .item_components
                .objectives
                .get(item_id)
                .map(|set| set.objectives.as_slice())
                .unwrap_or_default();
            objectives
                .iter()
                .filter(|obj| obj.completion_value > 1)
                .map(|obj| record_for(item_id, obj))
                .collect::<Vec<_>>()
        })
        .collect();

    records.sort_by(|a, b| a.item_instance_id.cmp(&b.item_instance_id));
    records
}

/// Extract owned exotic items from the profile-wide inventory.
///
/// `exotic_hashes` is the caller-supplied set of exotic item hashes;
/// manifest ingestion is out of scope here.
#[must_use]
pub fn extract_exotics(
    profile: &serde_json::Value,
    exotic_hashes: &HashSet<u64>,
) -> Vec<InventoryItem> {
    let data = profile_data(profile);

    data.profile_inventory
        .data
        .items
        .into_iter()
        .filter(|item| exotic_hashes.contains(&item.item_hash))
        .collect()
}
