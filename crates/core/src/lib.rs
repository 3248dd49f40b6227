//! # VaultWatch Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The extraction layer (red borders, catalysts, exotics)
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `vaultwatch-domain`
//! - No HTTP, disk, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod extract;
pub mod ports;

// Re-export specific items to avoid ambiguity
pub use extract::{extract_catalysts, extract_exotics, extract_red_borders, ProgressReport};
pub use ports::ProfileSource;
