use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GeocoderConfig;
use crate::kernel::BaseGeocoder;

/// Nominatim API response for geocoding
#[derive(Debug, Deserialize)]
struct NominatimResponse {
    lat: String,
    lon: String,
}

/// A resolved latitude/longitude pair.
///
/// Both halves always come from the same geocoder result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Parse the string-typed `lat`/`lon` fields the geocoder returns
    pub fn parse(lat: &str, lon: &str) -> Result<Self> {
        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid latitude in response: {}", e))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid longitude in response: {}", e))?;

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(anyhow!("Non-finite coordinates: {}, {}", lat, lon));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Split back into the nullable column pair
    pub fn into_columns(coords: Option<Self>) -> (Option<f64>, Option<f64>) {
        match coords {
            Some(c) => (Some(c.latitude), Some(c.longitude)),
            None => (None, None),
        }
    }
}

/// Free-text geocoder backed by Nominatim (OpenStreetMap)
pub struct NominatimGeocoder {
    client: reqwest::Client,
    url: String,
    user_agent: String,
    country_code: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build geocoder HTTP client")?;

        Ok(Self {
            client,
            url: config.url.clone(),
            user_agent: config.user_agent.clone(),
            country_code: config.country_code.clone(),
        })
    }

    /// Full request URL for a query: one result, restricted to the configured country
    pub fn request_url(&self, query: &str) -> String {
        format!(
            "{}?format=json&q={}&limit=1&countrycodes={}",
            self.url,
            urlencoding::encode(query),
            self.country_code
        )
    }
}

#[async_trait]
impl BaseGeocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(self.request_url(query))
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .context("Geocoding API request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Geocoding API returned non-success status");
            return Err(anyhow!("Geocoding API returned {}", status));
        }

        let places: Vec<NominatimResponse> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        let Some(place) = places.first() else {
            debug!("No geocoding results");
            return Ok(None);
        };

        let coords = Coordinates::parse(&place.lat, &place.lon)?;
        debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            "Geocoded"
        );

        Ok(Some(coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let coords = Coordinates::parse("-23.55", "-46.63").unwrap();
        assert_eq!(coords.latitude, -23.55);
        assert_eq!(coords.longitude, -46.63);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Coordinates::parse("abc", "-46.63").is_err());
        assert!(Coordinates::parse("-23.55", "").is_err());
        assert!(Coordinates::parse("NaN", "1.0").is_err());
    }

    #[test]
    fn test_into_columns_keeps_pair_together() {
        let coords = Coordinates {
            latitude: 1.5,
            longitude: 2.5,
        };
        assert_eq!(
            Coordinates::into_columns(Some(coords)),
            (Some(1.5), Some(2.5))
        );
        assert_eq!(Coordinates::into_columns(None), (None, None));
    }

    #[test]
    fn test_request_url_encodes_query() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig::default()).unwrap();
        let url = geocoder.request_url("Rua das Flores 123, São Paulo, SP, Brasil");

        assert!(url.starts_with("https://nominatim.openstreetmap.org/search?format=json&q="));
        assert!(url.contains("Rua%20das%20Flores%20123%2C%20S%C3%A3o%20Paulo"));
        assert!(url.ends_with("&limit=1&countrycodes=br"));
    }

    mod fake_nominatim {
        use axum::extract::{Query, State};
        use axum::http::{header::USER_AGENT, HeaderMap, StatusCode};
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::json;
        use std::collections::HashMap;
        use std::sync::{Arc, Mutex};

        /// (User-Agent, query params) per request
        pub type Seen = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

        async fn search(
            State(seen): State<Seen>,
            headers: HeaderMap,
            Query(params): Query<HashMap<String, String>>,
        ) -> Response {
            let agent = headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let q = params.get("q").cloned().unwrap_or_default();
            seen.lock().unwrap().push((agent, params));

            match q.as_str() {
                "down" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
                "nowhere" => Json(json!([])).into_response(),
                "bad" => Json(json!([{ "lat": "north", "lon": "-46.63" }])).into_response(),
                _ => Json(json!([
                    { "lat": "-23.55", "lon": "-46.63", "display_name": "São Paulo" },
                    { "lat": "0", "lon": "0" }
                ]))
                .into_response(),
            }
        }

        /// Serve on an ephemeral local port; returns the search URL
        pub async fn start(seen: Seen) -> String {
            let app = Router::new().route("/search", get(search)).with_state(seen);
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}/search", addr)
        }
    }

    #[tokio::test]
    async fn test_search_handles_each_response_shape() {
        let seen = fake_nominatim::Seen::default();
        let config = GeocoderConfig {
            url: fake_nominatim::start(seen.clone()).await,
            user_agent: "DispatchTests/1.0".to_string(),
            ..Default::default()
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();

        let err = geocoder.search("down").await.unwrap_err();
        assert!(err.to_string().contains("503"), "{err}");

        assert_eq!(geocoder.search("nowhere").await.unwrap(), None);

        assert!(geocoder.search("bad").await.is_err());

        let hit = geocoder.search("Rua das Flores 123, São Paulo").await.unwrap();
        assert_eq!(
            hit,
            Some(Coordinates {
                latitude: -23.55,
                longitude: -46.63
            })
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        for (agent, params) in seen.iter() {
            assert_eq!(agent, "DispatchTests/1.0");
            assert_eq!(params["format"], "json");
            assert_eq!(params["limit"], "1");
            assert_eq!(params["countrycodes"], "br");
        }
        assert_eq!(seen[3].1["q"], "Rua das Flores 123, São Paulo");
    }

    #[tokio::test]
    async fn test_geocode_live() {
        // Integration test - requires internet
        // Only runs when explicitly enabled
        if std::env::var("RUN_GEOCODING_TESTS").is_err() {
            return;
        }

        let geocoder = NominatimGeocoder::new(&GeocoderConfig::default()).unwrap();
        let coords = geocoder
            .search("São Paulo, SP, Brasil")
            .await
            .unwrap()
            .expect("São Paulo should resolve");

        assert!(coords.latitude < -23.0 && coords.latitude > -24.0);
        assert!(coords.longitude < -46.0 && coords.longitude > -47.0);
    }
}
