// Provider Dispatch - API Core
//
// Backend for the provider directory used to dispatch field agents:
// address geocoding, provider CRUD and accent-insensitive locality search.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
