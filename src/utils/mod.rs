//! Configuration utilities.

/// TOML configuration (`delve.toml`).
pub mod toml_config;
