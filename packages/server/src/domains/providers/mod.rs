//! Providers domain - field agent directory

pub mod activities;
pub mod address;
pub mod data;
pub mod geocoding;
pub mod models;

// Re-export commonly used types
pub use data::{CreateProviderInput, ProviderData, ProviderPage, UpdateProviderInput};
pub use geocoding::GeocodingResolver;
pub use models::{Provider, ProviderFilters, ProviderSearchError, ProviderTags};
