//! Configuration loader
//!
//! Builds the application [`Config`] from three layers, later layers winning:
//!
//! 1. A config file (explicit path, or the first location found)
//! 2. `SUNAT_*` environment variables
//! 3. Overrides supplied by the caller (command-line flags)
//!
//! ## Environment Variables
//! - `SUNAT_USER`: RUC followed by the SOL user
//! - `SUNAT_PASSWORD`: SOL password
//! - `SUNAT_CLIENT_ID`: API client id
//! - `SUNAT_CLIENT_SECRET`: API client secret
//! - `SUNAT_AUTH_BASE_URL`: Security API base URL
//! - `SUNAT_BASE_URL`: CPE API base URL
//! - `SUNAT_POLL_TIMEOUT_SECS`: Deadline for a ticket to resolve
//! - `SUNAT_POLL_INTERVAL_MS`: Delay between status queries
//! - `SUNAT_POLL_MAX_ATTEMPTS`: Cap on status queries
//! - `SUNAT_REQUEST_TIMEOUT_SECS`: Per-request HTTP timeout
//!
//! ## File Locations
//! Without an explicit path the loader checks, in order, `./.sunatapi.toml`,
//! `./.sunatapi.json`, `./sunat.toml` and `./sunat.json`, then the same names
//! in the user's home directory. JSON and TOML are detected by extension.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sunat_domain::{Config, RawConfig, Result, SunatError};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: &[&str] = &[".sunatapi.toml", ".sunatapi.json", "sunat.toml", "sunat.json"];

/// Load, merge and validate every configuration layer.
///
/// # Errors
/// Returns `SunatError::Config` when an explicit file is missing or invalid,
/// an environment variable cannot be parsed, or the merged result fails
/// validation.
pub fn load(path: Option<PathBuf>, overrides: RawConfig) -> Result<Config> {
    let file = load_from_file(path)?;
    let env = load_from_env()?;

    file.merge(env).merge(overrides).validate()
}

/// Read the `SUNAT_*` environment layer.
///
/// Unset or blank variables leave the field empty.
///
/// # Errors
/// Returns `SunatError::Config` when a numeric variable does not parse.
pub fn load_from_env() -> Result<RawConfig> {
    Ok(RawConfig {
        user: env_var("SUNAT_USER"),
        password: env_var("SUNAT_PASSWORD"),
        client_id: env_var("SUNAT_CLIENT_ID"),
        client_secret: env_var("SUNAT_CLIENT_SECRET"),
        auth_base_url: env_var("SUNAT_AUTH_BASE_URL"),
        base_url: env_var("SUNAT_BASE_URL"),
        poll_timeout_secs: env_number("SUNAT_POLL_TIMEOUT_SECS")?,
        poll_interval_ms: env_number("SUNAT_POLL_INTERVAL_MS")?,
        poll_max_attempts: env_number("SUNAT_POLL_MAX_ATTEMPTS")?,
        request_timeout_secs: env_number("SUNAT_REQUEST_TIMEOUT_SECS")?,
    })
}

/// Read the file layer.
///
/// With `Some(path)` the file must exist. With `None` the standard locations
/// are searched and an empty layer is returned when none exists.
///
/// # Errors
/// Returns `SunatError::Config` if the explicit file is missing, unreadable
/// or not valid JSON/TOML.
pub fn load_from_file(path: Option<PathBuf>) -> Result<RawConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SunatError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => match find_config_file() {
            Some(p) => p,
            None => {
                tracing::debug!("No config file found, using environment and flags only");
                return Ok(RawConfig::default());
            }
        },
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SunatError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse a file layer; the format follows the extension (`.json` or
/// `.toml`, JSON when there is none).
fn parse_config(contents: &str, path: &Path) -> Result<RawConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| SunatError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents).map_err(|e| SunatError::from(InfraError::from(e))),
        _ => Err(SunatError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file in the working directory, then the home
/// directory.
pub fn find_config_file() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        roots.push(PathBuf::from(home));
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

/// Non-blank environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Optional numeric environment variable.
///
/// # Errors
/// Returns `SunatError::Config` if the variable is set but does not parse.
fn env_number<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| SunatError::Config(format!("Invalid value for {key} ({raw}): {e}")))
        })
        .transpose()
}
