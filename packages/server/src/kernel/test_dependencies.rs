// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BaseGeocoder, ServerDeps};
use crate::common::utils::Coordinates;

// =============================================================================
// Mock Geocoder
// =============================================================================

/// Scripted outcome for one geocoder call
#[derive(Debug, Clone)]
pub enum MockGeocodeResponse {
    Found(Coordinates),
    Empty,
    Failure(String),
}

pub struct MockGeocoder {
    responses: Arc<Mutex<Vec<MockGeocodeResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGeocoder {
    /// A geocoder that answers every query with zero results
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a hit for the next unanswered call
    pub fn with_hit(self, latitude: f64, longitude: f64) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockGeocodeResponse::Found(Coordinates {
                latitude,
                longitude,
            }));
        self
    }

    /// Queue a zero-result answer for the next unanswered call
    pub fn with_empty(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockGeocodeResponse::Empty);
        self
    }

    /// Queue a failure (e.g. a 503 from the service) for the next unanswered call
    pub fn with_failure(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockGeocodeResponse::Failure(message.to_string()));
        self
    }

    /// All queries received, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseGeocoder for MockGeocoder {
    async fn search(&self, query: &str) -> Result<Option<Coordinates>> {
        self.calls.lock().unwrap().push(query.to_string());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(None);
        }

        match responses.remove(0) {
            MockGeocodeResponse::Found(coords) => Ok(Some(coords)),
            MockGeocodeResponse::Empty => Ok(None),
            MockGeocodeResponse::Failure(message) => Err(anyhow!(message)),
        }
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builds ServerDeps around mocks, with no pacing between geocoder calls
pub struct TestDependencies {
    pub geocoder: Arc<MockGeocoder>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            geocoder: Arc::new(MockGeocoder::new()),
        }
    }

    pub fn with_geocoder(geocoder: MockGeocoder) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
        }
    }

    pub fn into_server_deps(self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(db_pool, self.geocoder, Duration::ZERO)
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
