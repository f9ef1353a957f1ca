//! Typed ID definitions for domain entities.
//!
//! ```rust,ignore
//! use crate::common::ProviderId;
//!
//! let provider_id = ProviderId::new();
//! ```

pub use super::id::Id;

/// Marker type for Provider entities (field agents).
pub struct Provider;

/// Typed ID for Provider entities.
pub type ProviderId = Id<Provider>;
