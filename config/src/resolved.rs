//! Resolved, invariant-safe configuration.
//!
//! Converts the optional, boundary-level [`WaypointConfig`] into concrete
//! values so nothing downstream handles `Option` defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::{ConfigError, IdentifierSource, Platform, WaypointConfig, expand_env_vars_with};

pub const DEFAULT_BASE_URL: &str = "https://domain.com";
pub const DEFAULT_REGISTRATION_PATH: &str = "/api/v1/register";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LAUNCH_SCREEN_DELAY: Duration = Duration::from_secs(2);

const BASE_URL_ENV: &str = "WAYPOINT_SERVER_BASE_URL";
const TIMEOUT_ENV: &str = "WAYPOINT_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSetting {
    Vendor,
    Static(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Full registration URL. Deliberately not parsed here: a malformed value
    /// is a registration-time configuration fault.
    pub registration_endpoint: String,
    pub timeout: Duration,
    pub https_only: bool,
    pub platform: Platform,
    pub identifier: IdentifierSetting,
    pub validate_content_location: bool,
    pub data_dir: PathBuf,
    pub launch_screen_delay: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            registration_endpoint: join_endpoint(DEFAULT_BASE_URL, DEFAULT_REGISTRATION_PATH),
            timeout: DEFAULT_TIMEOUT,
            https_only: true,
            platform: Platform::current(),
            identifier: IdentifierSetting::Vendor,
            validate_content_location: true,
            data_dir: default_data_dir(),
            launch_screen_delay: DEFAULT_LAUNCH_SCREEN_DELAY,
        }
    }
}

impl ResolvedConfig {
    pub fn from_config(config: &WaypointConfig) -> Result<Self, ConfigError> {
        Self::from_config_with_env(config, |name| env::var(name).ok())
    }

    pub fn from_config_with_env(
        config: &WaypointConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let server = config.server.as_ref();

        let base_url = lookup(BASE_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| server.and_then(|s| s.base_url.clone()))
            .map(|value| expand_env_vars_with(&value, &lookup))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let registration_path = server
            .and_then(|s| s.registration_path.as_deref())
            .unwrap_or(DEFAULT_REGISTRATION_PATH);

        let timeout = lookup(TIMEOUT_ENV)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .or_else(|| config.http.as_ref().and_then(|h| h.timeout_secs))
            .filter(|secs| *secs > 0)
            .map_or(defaults.timeout, Duration::from_secs);
        let https_only = config.http.as_ref().map_or(true, |h| h.https_only);

        let client = config.client.as_ref();
        let platform = client
            .and_then(|c| c.platform)
            .unwrap_or(defaults.platform);
        let identifier = match client.map(|c| c.identifier).unwrap_or_default() {
            IdentifierSource::Vendor => IdentifierSetting::Vendor,
            IdentifierSource::Static => {
                let value = client
                    .and_then(|c| c.static_identifier.as_deref())
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| ConfigError::Invalid {
                        field: "client.static_identifier",
                        reason: "required when client.identifier = \"static\"".to_string(),
                    })?;
                IdentifierSetting::Static(value.to_string())
            }
        };

        let validate_content_location = config
            .registration
            .as_ref()
            .map_or(true, |r| r.validate_content_location);

        let data_dir = config
            .storage
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .unwrap_or(defaults.data_dir);

        let launch_screen_delay = config
            .app
            .as_ref()
            .and_then(|a| a.launch_screen_delay_ms)
            .map_or(defaults.launch_screen_delay, Duration::from_millis);

        Ok(Self {
            registration_endpoint: join_endpoint(&base_url, registration_path),
            timeout,
            https_only,
            platform,
            identifier,
            validate_content_location,
            data_dir,
            launch_screen_delay,
        })
    }
}

fn join_endpoint(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// `~/.waypoint/data`, or `./.waypoint/data` when there is no home directory.
fn default_data_dir() -> PathBuf {
    crate::waypoint_dir()
        .unwrap_or_else(|| PathBuf::from(".waypoint"))
        .join("data")
}
