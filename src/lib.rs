pub mod app;
pub mod auth;
pub mod azure;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;

pub use error::{Result, ShipError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
