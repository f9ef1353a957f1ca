//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by provider activities.
//! External services sit behind trait abstractions so tests can swap in mocks.

use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::common::utils::NominatimGeocoder;
use crate::config::GeocoderConfig;
use crate::domains::providers::geocoding::GeocodingResolver;
use crate::kernel::BaseGeocoder;

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub geocoder: Arc<dyn BaseGeocoder>,
    /// Pause between two geocoder calls for the same address
    pub geocoding_delay: Duration,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(db_pool: PgPool, geocoder: Arc<dyn BaseGeocoder>, geocoding_delay: Duration) -> Self {
        Self {
            db_pool,
            geocoder,
            geocoding_delay,
        }
    }

    /// Production wiring: Nominatim with the configured pacing
    pub fn from_config(db_pool: PgPool, config: &GeocoderConfig) -> Result<Self> {
        let geocoder = Arc::new(NominatimGeocoder::new(config)?);
        Ok(Self::new(db_pool, geocoder, config.delay))
    }

    /// Resolver bound to this geocoder and pacing
    pub fn geocoding_resolver(&self) -> GeocodingResolver {
        GeocodingResolver::new(self.geocoder.clone(), self.geocoding_delay)
    }
}
