//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use test_dependencies::{MockGeocodeResponse, MockGeocoder, TestDependencies};
pub use traits::*;
