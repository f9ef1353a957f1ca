// HTTP routes
pub mod health;
pub mod providers;

pub use health::*;
pub use providers::*;
