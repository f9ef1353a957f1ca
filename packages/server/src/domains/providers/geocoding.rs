//! Provider geocoding: try address variants in order until one resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::common::utils::Coordinates;
use crate::domains::providers::address::{address_variants, AddressParts};
use crate::kernel::BaseGeocoder;

/// Outcome of one candidate lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Found(T),
    Miss,
}

/// Run `attempt` over `candidates` in order and return the first hit.
///
/// Candidates are tried one at a time with `delay` between consecutive
/// attempts (none before the first or after the last). Later candidates are
/// never tried once one is found.
pub async fn first_match<C, T, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    delay: Duration,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    for (index, candidate) in candidates.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Attempt::Found(value) = attempt(candidate).await {
            return Some(value);
        }
    }

    None
}

/// Resolves provider addresses to coordinates through a [`BaseGeocoder`].
#[derive(Clone)]
pub struct GeocodingResolver {
    geocoder: Arc<dyn BaseGeocoder>,
    delay: Duration,
}

impl GeocodingResolver {
    pub fn new(geocoder: Arc<dyn BaseGeocoder>, delay: Duration) -> Self {
        Self { geocoder, delay }
    }

    /// Coordinates for the most specific variant the geocoder knows, or `None`.
    ///
    /// Never fails: an incomplete address returns `None` without any lookup,
    /// and per-variant errors only skip that variant.
    pub async fn resolve(&self, address: &AddressParts) -> Option<Coordinates> {
        if !address.is_complete() {
            debug!("Address incomplete, skipping geocoding");
            return None;
        }

        let variants = address_variants(address);
        let total = variants.len();
        let geocoder = &self.geocoder;

        let found = first_match(
            variants.into_iter().enumerate(),
            self.delay,
            |(index, query)| async move {
                match geocoder.search(&query).await {
                    Ok(Some(coords)) => {
                        info!(
                            variant = index + 1,
                            of = total,
                            query = %query,
                            "Address geocoded"
                        );
                        Attempt::Found(coords)
                    }
                    Ok(None) => {
                        debug!(variant = index + 1, query = %query, "No geocoding result");
                        Attempt::Miss
                    }
                    Err(e) => {
                        warn!(
                            variant = index + 1,
                            query = %query,
                            error = %e,
                            "Geocoding attempt failed"
                        );
                        Attempt::Miss
                    }
                }
            },
        )
        .await;

        if found.is_none() {
            warn!(
                city = %address.city,
                state = %address.state,
                variants = total,
                "Address could not be geocoded"
            );
        }

        found
    }
}
