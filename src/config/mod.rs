//! Configuration module.
//!
//! Handles the settings file, its search order and environment variable
//! expansion.

mod settings;

pub use settings::{expand_env_vars, CacheSettings, ServiceSettings, Settings, SettingsError};
