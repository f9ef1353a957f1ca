// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "geocode a provider address") lives in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseGeocoder)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::utils::Coordinates;

// =============================================================================
// Geocoder Trait (Infrastructure - free-text place search)
// =============================================================================

#[async_trait]
pub trait BaseGeocoder: Send + Sync {
    /// Look up a single free-text query.
    ///
    /// `Ok(None)` means the service answered with zero results.
    /// Transport failures, non-success statuses and unparseable coordinates are errors.
    async fn search(&self, query: &str) -> Result<Option<Coordinates>>;
}
