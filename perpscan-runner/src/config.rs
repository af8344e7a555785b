//! Scanner configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. CLI flags override values after loading.

use perpscan_core::data::bybit::DEFAULT_BASE_URL;
use perpscan_core::data::cache::DEFAULT_CACHE_CAPACITY;
use perpscan_core::data::series_builder::{DEFAULT_TARGET_BARS, MIN_BARS};
use perpscan_core::data::transport::{DEFAULT_API_KEY_ENV, DEFAULT_TIMEOUT};
use perpscan_core::data::universe::DEFAULT_QUOTE_SUFFIX;
use perpscan_core::data::RetryPolicy;
use perpscan_core::domain::OpenInterestWindow;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default indicator windows in minutes: 5M, 15M, 30M, 1H, 4H.
pub const DEFAULT_WINDOWS: [usize; 5] = [5, 15, 30, 60, 240];

/// Default worker pool size.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub scan: ScanSettings,
    pub export: ExportConfig,
    pub notify: NotifyConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Environment variable holding the optional API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Bars per series (1-minute klines).
    pub target_bars: usize,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target_bars: DEFAULT_TARGET_BARS,
            max_attempts: RetryPolicy::default().max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Indicator windows in minutes.
    pub windows: Vec<usize>,
    /// Symbol that correlations are measured against.
    pub benchmark: String,
    pub quote_suffix: String,
    pub concurrency: usize,
    /// Scan only the N highest-turnover symbols.
    pub top_n: Option<usize>,
    /// Emit percentile companion columns.
    pub percentiles: bool,
    /// Open-interest change columns, one per window.
    pub oi_windows: Vec<OpenInterestWindow>,
    pub cache_capacity: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            benchmark: "BTCUSDT".to_string(),
            quote_suffix: DEFAULT_QUOTE_SUFFIX.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            top_n: None,
            percentiles: true,
            oi_windows: vec![OpenInterestWindow::Day],
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub csv: bool,
    pub html: bool,
    /// Keep only this many most recent exports per format.
    pub keep_exports: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("scans"),
            csv: true,
            html: true,
            keep_exports: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
        }
    }
}

impl ScanConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.windows.is_empty() {
            return Err(ConfigError::Invalid("scan.windows must not be empty".into()));
        }
        if self.scan.windows.contains(&0) {
            return Err(ConfigError::Invalid("scan.windows must be positive".into()));
        }
        for (i, w) in self.scan.oi_windows.iter().enumerate() {
            if self.scan.oi_windows[..i].contains(w) {
                return Err(ConfigError::Invalid(format!(
                    "scan.oi_windows lists {w:?} more than once"
                )));
            }
        }
        if self.scan.benchmark.trim().is_empty() {
            return Err(ConfigError::Invalid("scan.benchmark must be set".into()));
        }
        if self.scan.concurrency == 0 {
            return Err(ConfigError::Invalid("scan.concurrency must be >= 1".into()));
        }
        if self.fetch.target_bars < MIN_BARS {
            return Err(ConfigError::Invalid(format!(
                "fetch.target_bars must be >= {MIN_BARS}, got {}",
                self.fetch.target_bars
            )));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be >= 1".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be >= 1".into()));
        }
        if self.schedule.interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "schedule.interval_minutes must be >= 1".into(),
            ));
        }
        if self.export.keep_exports == Some(0) {
            return Err(ConfigError::Invalid("export.keep_exports must be >= 1".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch.max_attempts,
            ..RetryPolicy::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_minutes * 60)
    }
}
