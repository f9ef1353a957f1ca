// Business domains
pub mod providers;
