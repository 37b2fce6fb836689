use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Request options passed through to the transport unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP method (e.g. "GET").
    pub method: String,
    /// Extra request headers, name -> value.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: "GET".to_string(),
            headers,
        }
    }
}

/// Which body field and values mark a response as pending or errored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    pub field: String,
    pub pending_value: String,
    pub error_value: String,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            field: "result".to_string(),
            pending_value: "pending".to_string(),
            error_value: "error".to_string(),
        }
    }
}

/// Windowed polling schedule (optional `[windows]` section).
///
/// Polls `polls_per_window` times at the base interval inside each window, then
/// waits until the next window start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window start offsets in milliseconds, relative to the start of the cycle.
    pub window_starts_ms: Vec<u64>,
    pub polls_per_window: u32,
}

/// Polling configuration loaded from `~/.config/longpoll/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Status endpoint to poll.
    pub url: String,
    /// Base delay between pending polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Optional exponential backoff base; delay = interval * base^poll_count.
    #[serde(default)]
    pub exp_backoff: Option<f64>,
    /// Maximum number of polls per retry cycle.
    pub max_polls: u32,
    /// Maximum retry counter. The counter starts at -1, so 0 means one cycle.
    pub max_retries: u32,
    /// Delay before the first poll of every cycle, in milliseconds.
    pub initial_delay_ms: u64,
    /// Per-request timeout, in milliseconds.
    pub timeout_ms: u64,
    #[serde(default)]
    pub request: RequestOptions,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub windows: Option<WindowConfig>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/status".to_string(),
            poll_interval_ms: 25,
            exp_backoff: None,
            max_polls: 600,
            max_retries: 0,
            initial_delay_ms: 0,
            timeout_ms: 10_000,
            request: RequestOptions::default(),
            classify: ClassifyConfig::default(),
            windows: None,
        }
    }
}

/// Reasons a `PollConfig` is rejected before polling starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("exp_backoff must be a positive finite number, got {0}")]
    InvalidBackoff(f64),
    #[error("windows.polls_per_window must be greater than zero")]
    ZeroPollsPerWindow,
    #[error("windows.window_starts_ms must not be empty")]
    NoWindows,
    #[error("windows.window_starts_ms must be non-decreasing")]
    UnorderedWindows,
}

impl PollConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before each cycle. A windowed schedule starts at its first window.
    pub fn initial_delay(&self) -> Duration {
        match self.windows.as_ref().and_then(|w| w.window_starts_ms.first()) {
            Some(&first) => Duration::from_millis(first),
            None => Duration::from_millis(self.initial_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(base) = self.exp_backoff {
            if !base.is_finite() || base <= 0.0 {
                return Err(ConfigError::InvalidBackoff(base));
            }
        }
        if let Some(w) = &self.windows {
            if w.polls_per_window == 0 {
                return Err(ConfigError::ZeroPollsPerWindow);
            }
            if w.window_starts_ms.is_empty() {
                return Err(ConfigError::NoWindows);
            }
            if w.window_starts_ms.windows(2).any(|p| p[1] < p[0]) {
                return Err(ConfigError::UnorderedWindows);
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("longpoll")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PollConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PollConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<PollConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: PollConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
