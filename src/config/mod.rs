//! Configuration module for the merge pipeline
//!
//! Provides types and parsing for `furnimerge.toml`.

pub mod loader;
pub mod schema;

pub use loader::{default_config, load_config, CliOverrides, ConfigError, CONFIG_FILENAME};
pub use schema::*;
