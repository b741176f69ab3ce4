//! Configuration utilities.

/// TOML configuration file, validation and hot-reloading manager.
pub mod toml_config;
