pub mod provider;
pub mod provider_tag;
pub mod search;

pub use provider::*;
pub use provider_tag::*;
pub use search::*;
