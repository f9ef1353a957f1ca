use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub geocoder: GeocoderConfig,
}

/// Settings for the outbound free-text geocoder (Nominatim-compatible)
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub url: String,
    pub user_agent: String,
    pub country_code: String,
    /// Pause between two variant lookups for the same address
    pub delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "DispatchBackend/1.0 (provider geocoding)".to_string(),
            country_code: "br".to_string(),
            delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = GeocoderConfig::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            geocoder: GeocoderConfig {
                url: env::var("GEOCODER_URL").unwrap_or(defaults.url),
                user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
                country_code: env::var("GEOCODER_COUNTRY_CODE").unwrap_or(defaults.country_code),
                delay: match env::var("GEOCODER_DELAY_MS") {
                    Ok(v) => Duration::from_millis(
                        v.parse().context("GEOCODER_DELAY_MS must be a valid number")?,
                    ),
                    Err(_) => defaults.delay,
                },
                timeout: match env::var("GEOCODER_TIMEOUT_SECS") {
                    Ok(v) => Duration::from_secs(
                        v.parse()
                            .context("GEOCODER_TIMEOUT_SECS must be a valid number")?,
                    ),
                    Err(_) => defaults.timeout,
                },
            },
        })
    }
}

/// Split a comma-separated env value, dropping blanks
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
