use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_MODE_PREFIX: &str = "tailscale:";
pub const DEFAULT_PROVIDER_MARKER: &str = ".mullvad.";
pub const DEFAULT_NOTIFICATION_DISPLAY_MS: u64 = 3_000;
pub const DEFAULT_NOTIFICATION_FADE_MS: u64 = 500;

pub const ENV_BASE_URL: &str = "EXIT_PANEL_BASE_URL";
pub const ENV_MODE_PREFIX: &str = "EXIT_PANEL_MODE_PREFIX";
pub const ENV_PROVIDER_MARKER: &str = "EXIT_PANEL_PROVIDER_MARKER";
pub const ENV_NOTIFICATION_DISPLAY_MS: &str = "EXIT_PANEL_NOTIFICATION_DISPLAY_MS";
pub const ENV_NOTIFICATION_FADE_MS: &str = "EXIT_PANEL_NOTIFICATION_FADE_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "EXIT_PANEL_POLL_INTERVAL_MS";
pub const ENV_USERNAME: &str = "EXIT_PANEL_USERNAME";
pub const ENV_PASSWORD: &str = "EXIT_PANEL_PASSWORD";

pub const STATUS_PATH: &str = "/status";
pub const FRIENDLY_NAMES_PATH: &str = "/friendly-names.json";
pub const SET_MODE_PATH: &str = "/set-mode";
pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {message}")]
    InvalidNumber { key: &'static str, message: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Origin of the control endpoint. The browser shell ignores it and uses
    /// same-origin paths.
    pub base_url: String,
    pub mode_prefix: String,
    pub provider_marker: String,
    pub notification_display: Duration,
    pub notification_fade: Duration,
    /// `None` disables background polling.
    pub poll_interval: Option<Duration>,
    pub credentials: Option<Credentials>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mode_prefix: DEFAULT_MODE_PREFIX.to_string(),
            provider_marker: DEFAULT_PROVIDER_MARKER.to_string(),
            notification_display: Duration::from_millis(DEFAULT_NOTIFICATION_DISPLAY_MS),
            notification_fade: Duration::from_millis(DEFAULT_NOTIFICATION_FADE_MS),
            poll_interval: None,
            credentials: None,
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key source; absent or blank keys
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        let base_url = match value(ENV_BASE_URL) {
            Some(raw) => normalize_base_url(&raw)?,
            None => defaults.base_url,
        };
        let mode_prefix = lookup(ENV_MODE_PREFIX).unwrap_or(defaults.mode_prefix);
        let provider_marker = match lookup(ENV_PROVIDER_MARKER) {
            Some(marker) if marker.is_empty() => {
                return Err(ConfigError::Empty {
                    key: ENV_PROVIDER_MARKER,
                });
            }
            Some(marker) => marker,
            None => defaults.provider_marker,
        };
        let notification_display = parse_millis(
            ENV_NOTIFICATION_DISPLAY_MS,
            value(ENV_NOTIFICATION_DISPLAY_MS),
        )?
        .unwrap_or(defaults.notification_display);
        let notification_fade = parse_millis(ENV_NOTIFICATION_FADE_MS, value(ENV_NOTIFICATION_FADE_MS))?
            .unwrap_or(defaults.notification_fade);
        let poll_interval = parse_millis(ENV_POLL_INTERVAL_MS, value(ENV_POLL_INTERVAL_MS))?
            .filter(|interval| !interval.is_zero());
        let credentials = match (value(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        Ok(Self {
            base_url,
            mode_prefix,
            provider_marker,
            notification_display,
            notification_fade,
            poll_interval,
            credentials,
        })
    }

    /// Absolute URL for `path` against [`PanelConfig::base_url`].
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn parse_millis(key: &'static str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    raw.map(|raw| {
        raw.parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|error| ConfigError::InvalidNumber {
                key,
                message: error.to_string(),
            })
    })
    .transpose()
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if !matches!(scheme, "http" | "https") || remainder.is_empty() || remainder.starts_with('/')
    {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

/// Whether a response URL points at the login page, which the backend's auth
/// middleware redirects to once the session cookie is gone.
pub fn is_login_location(url: &str) -> bool {
    let path = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest.find('/').map_or("", |index| &rest[index..]));
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/') == LOGIN_PATH
}
