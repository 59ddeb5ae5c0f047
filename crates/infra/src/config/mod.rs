//! Configuration loading and management
//!
//! This module layers configuration from files, environment variables and
//! caller overrides into a validated `Config`.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, find_config_file};
