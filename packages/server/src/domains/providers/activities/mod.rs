//! Provider activities - business logic called from the HTTP routes
//! and the backfill binary.

mod mutations;
mod queries;

pub use mutations::*;
pub use queries::*;
