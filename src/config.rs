//! Client configuration loading: JSON file, environment overrides, built-in defaults.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::state::Role;

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/client.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "JEOPARDY_CLIENT_CONFIG_PATH";
const API_URL_ENV: &str = "JEOPARDY_API_URL";
const WS_URL_ENV: &str = "JEOPARDY_WS_URL";
const ROLE_ENV: &str = "JEOPARDY_ROLE";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
const DEFAULT_ROSTER_POLL_INTERVAL: Duration = Duration::from_millis(2000);
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the client.
pub struct AppConfig {
    /// Base URL of the HTTP API.
    pub api_base_url: String,
    /// URL of the push channel.
    pub ws_url: String,
    /// Role announced on connect.
    pub role: Role,
    /// Interval between roster polls.
    pub roster_poll_interval: Duration,
    /// Reconnect attempts after the channel drops; `0` disables reconnecting.
    pub max_reconnect_attempts: u32,
    /// Ask for a `game_state` snapshot after every (re)connect.
    pub request_snapshot_on_open: bool,
    /// Upper bound on every HTTP request.
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path()).with_env_overrides(|key| env::var(key).ok())
    }

    /// Load the configuration file at `path`, ignoring the environment.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        role = %config.role,
                        api = %config.api_base_url,
                        "loaded client config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Apply single-value overrides looked up through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get(API_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(url) = get(WS_URL_ENV) {
            self.ws_url = url;
        }
        if let Some(role) = get(ROLE_ENV) {
            match role.parse() {
                Ok(role) => self.role = role,
                Err(err) => warn!(var = ROLE_ENV, error = %err, "ignoring role override"),
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            role: Role::default(),
            roster_poll_interval: DEFAULT_ROSTER_POLL_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            request_snapshot_on_open: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    api_base_url: Option<String>,
    ws_url: Option<String>,
    role: Option<Role>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "roster_poll_interval_ms")]
    roster_poll_interval: Option<Duration>,
    max_reconnect_attempts: Option<u32>,
    request_snapshot_on_open: Option<bool>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "request_timeout_ms")]
    request_timeout: Option<Duration>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: value.api_base_url.unwrap_or(defaults.api_base_url),
            ws_url: value.ws_url.unwrap_or(defaults.ws_url),
            role: value.role.unwrap_or(defaults.role),
            roster_poll_interval: non_zero(
                "roster_poll_interval_ms",
                value.roster_poll_interval,
                defaults.roster_poll_interval,
            ),
            max_reconnect_attempts: value
                .max_reconnect_attempts
                .unwrap_or(defaults.max_reconnect_attempts),
            request_snapshot_on_open: value
                .request_snapshot_on_open
                .unwrap_or(defaults.request_snapshot_on_open),
            request_timeout: non_zero(
                "request_timeout_ms",
                value.request_timeout,
                defaults.request_timeout,
            ),
        }
    }
}

/// Zero durations are rejected in favour of the default.
fn non_zero(field: &'static str, value: Option<Duration>, default: Duration) -> Duration {
    match value {
        Some(duration) if duration.is_zero() => {
            warn!(field, "zero duration in config; using default");
            default
        }
        Some(duration) => duration,
        None => default,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
