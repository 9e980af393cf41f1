//! Configuration for Waypoint.
//!
//! [`WaypointConfig`] is the boundary view of `~/.waypoint/config.toml`: every
//! section and field is optional. [`ResolvedConfig`] turns it into the concrete
//! settings the rest of the workspace consumes, applying defaults and the
//! `WAYPOINT_*` environment overrides.
//!
//! ```toml
//! [server]
//! base_url = "https://domain.com"
//! registration_path = "/api/v1/register"
//!
//! [http]
//! timeout_secs = 30
//! https_only = true
//!
//! [client]
//! platform = "mobile"
//! identifier = "vendor"
//!
//! [registration]
//! validate_content_location = true
//!
//! [storage]
//! data_dir = "/var/lib/waypoint"
//!
//! [app]
//! launch_screen_delay_ms = 2000
//! ```

mod resolved;

use serde::Deserialize;
use std::{fs, path::PathBuf};

pub use resolved::{
    DEFAULT_BASE_URL, DEFAULT_LAUNCH_SCREEN_DELAY, DEFAULT_REGISTRATION_PATH, DEFAULT_TIMEOUT,
    IdentifierSetting, ResolvedConfig,
};

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct WaypointConfig {
    pub server: Option<ServerConfig>,
    pub http: Option<HttpConfig>,
    pub client: Option<ClientConfig>,
    pub registration: Option<RegistrationConfig>,
    pub storage: Option<StorageConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the registration server. `${VAR}` references are expanded.
    pub base_url: Option<String>,
    /// Path appended to `base_url`. Default: `/api/v1/register`.
    pub registration_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpConfig {
    /// Applied to both connect and whole-request phases. Default: 30.
    pub timeout_secs: Option<u64>,
    /// Refuse plain-http endpoints. Default: true.
    #[serde(default = "default_true")]
    pub https_only: bool,
}

/// Platform flavor the client presents itself as.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// UI platform: requests carry a mobile browser User-Agent.
    Mobile,
    /// No UI: no User-Agent is injected.
    Headless,
}

impl Platform {
    /// Platform implied by the build target.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(any(target_os = "ios", target_os = "android")) {
            Self::Mobile
        } else {
            Self::Headless
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Headless => "headless",
        }
    }
}

/// Where the installation identifier comes from.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierSource {
    /// Stable per-install UUID kept in the data directory.
    #[default]
    Vendor,
    /// Fixed value from `static_identifier`.
    Static,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientConfig {
    pub platform: Option<Platform>,
    #[serde(default)]
    pub identifier: IdentifierSource,
    pub static_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationConfig {
    /// Reject granted locations that are not absolute URLs. Default: true.
    #[serde(default = "default_true")]
    pub validate_content_location: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            validate_content_location: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Minimum time the launch screen stays up while the route resolves.
    pub launch_screen_delay_ms: Option<u64>,
}

/// Expand `${VAR}` references using `lookup`. Unknown variables become empty.
pub fn expand_env_vars_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if var.is_empty() {
            out.push_str("${}");
        } else {
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl WaypointConfig {
    /// Load the config file. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: PathBuf) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }
}

#[must_use]
pub fn waypoint_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".waypoint"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    waypoint_dir().map(|dir| dir.join("config.toml"))
}
