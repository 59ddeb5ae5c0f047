//! Configuration management
//!
//! Configuration arrives in layers (config file, environment, command-line
//! flags). Each layer is a [`RawConfig`] with every field optional; layers are
//! merged with [`RawConfig::merge`] and the result is checked once by
//! [`RawConfig::validate`], which reports every missing setting together.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_AUTH_BASE_URL, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::errors::{Result, SunatError};
use crate::types::Credentials;

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: EndpointConfig,
    pub poll: PollConfig,
    pub http: HttpConfig,
}

/// Remote endpoints, without trailing slashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub auth_base_url: String,
    pub base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Poll loop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Overall deadline for the ticket to resolve
    pub timeout: Duration,
    /// Delay between consecutive status queries
    pub interval: Duration,
    /// Optional cap on status queries; `None` means deadline-bounded only
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: None,
        }
    }
}

/// HTTP transport tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout for the auth, submit and status calls
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS) }
    }
}

/// One configuration layer. Every field is optional.
///
/// Field aliases accept the flat lower-case keys of older `.sunatapi` files
/// (`clientid`, `authbaseurl`, ...).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(alias = "clientid")]
    pub client_id: Option<String>,
    #[serde(alias = "clientsecret", skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(alias = "authbaseurl", alias = "auth_url")]
    pub auth_base_url: Option<String>,
    #[serde(alias = "baseurl")]
    pub base_url: Option<String>,
    pub poll_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for RawConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_base_url", &self.auth_base_url)
            .field("base_url", &self.base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl RawConfig {
    /// Overlay `other` on top of `self`; values set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            auth_base_url: other.auth_base_url.or(self.auth_base_url),
            base_url: other.base_url.or(self.base_url),
            poll_timeout_secs: other.poll_timeout_secs.or(self.poll_timeout_secs),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            poll_max_attempts: other.poll_max_attempts.or(self.poll_max_attempts),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    /// Names of required settings that are unset or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("user", &self.user),
            ("password", &self.password),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    /// Check the merged layers and build a [`Config`].
    ///
    /// # Errors
    /// Returns `SunatError::Config` listing every missing credential, or
    /// describing the first malformed URL or zero duration.
    pub fn validate(self) -> Result<Config> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(SunatError::Config(format!(
                "required configurations not set: {}",
                missing.join(", ")
            )));
        }

        let endpoints = EndpointConfig {
            auth_base_url: normalize_url(
                "auth_base_url",
                self.auth_base_url.as_deref().unwrap_or(DEFAULT_AUTH_BASE_URL),
            )?,
            base_url: normalize_url("base_url", self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?,
        };

        let poll = PollConfig {
            timeout: Duration::from_secs(non_zero(
                "poll_timeout_secs",
                self.poll_timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            )?),
            interval: Duration::from_millis(non_zero(
                "poll_interval_ms",
                self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            )?),
            max_attempts: match self.poll_max_attempts {
                Some(0) => {
                    return Err(SunatError::Config(
                        "poll_max_attempts must be at least 1".to_string(),
                    ))
                }
                other => other,
            },
        };

        let http = HttpConfig {
            request_timeout: Duration::from_secs(non_zero(
                "request_timeout_secs",
                self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            )?),
        };

        let credentials = Credentials::new(
            self.client_id.unwrap_or_default(),
            self.client_secret.unwrap_or_default(),
            self.user.unwrap_or_default(),
            self.password.unwrap_or_default(),
        );

        Ok(Config { credentials, endpoints, poll, http })
    }
}

fn normalize_url(field: &str, raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| SunatError::Config(format!("{field} is not a valid URL ({raw}): {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SunatError::Config(format!("{field} must use http or https: {raw}")));
    }

    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn non_zero(field: &str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(SunatError::Config(format!("{field} must be greater than zero")));
    }
    Ok(value)
}
