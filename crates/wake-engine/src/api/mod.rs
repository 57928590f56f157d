pub mod config;
pub mod constants;
pub mod error;
pub mod policy;
#[cfg(feature = "physics")]
pub mod sim;
pub mod types;
