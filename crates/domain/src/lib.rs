//! # VaultWatch Domain
//!
//! Business domain types and models for VaultWatch.
//!
//! This crate contains:
//! - Domain data types (Session, CachedProfileEntry, MembershipIdentity, ...)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants (API endpoints, intervals, TTLs)
//!
//! ## Architecture
//! - No dependencies on other VaultWatch crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
