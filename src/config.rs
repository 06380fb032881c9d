//! Configuration for the condensate monitor.

use crate::core::types::Channel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration: pipeline tunables plus where rows come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Settings passed to every pipeline run
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Where raw rows are fetched from
    #[serde(default)]
    pub source: SourceConfig,

    /// Port for the dashboard API
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    5000
}

const REDACTED: &str = "********";

/// Widest accepted resampling bucket.
pub const MAX_BUCKET_WIDTH: Duration = Duration::from_secs(24 * 60 * 60);

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Copy of this configuration with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let SourceConfig::Remote { token, .. } = &mut config.source {
            if !token.is_empty() {
                *token = REDACTED.to_string();
            }
        }
        config
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("condensate-monitor")
            .join("config.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            source: SourceConfig::default(),
            port: default_port(),
        }
    }
}

/// Field and display names for one temperature channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Column name in the raw rows (matched after trimming)
    pub field: String,
    /// Name shown in charts and forecasts
    pub display_name: String,
}

impl ChannelSpec {
    pub fn new(field: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            display_name: display_name.into(),
        }
    }
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column holding the day-first date-time string
    pub timestamp_field: String,

    /// The three channels, in reading-vector order
    pub channels: [ChannelSpec; 3],

    /// Readings strictly above this value are breaches (°C)
    pub breach_threshold: f64,

    /// Width of each resampling bucket, and forecast horizon
    #[serde(with = "minutes_serde", rename = "bucket_minutes")]
    pub bucket_width: Duration,

    /// Number of buckets kept in the chart window
    pub window_size: usize,

    /// Maximum number of breach rows reported
    pub breach_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timestamp_field: "FechaHora".to_string(),
            channels: [
                ChannelSpec::new("Temp 1", "Temp 1"),
                ChannelSpec::new("Temp 2", "Temp 2"),
                ChannelSpec::new("Temp3", "Temp3"),
            ],
            breach_threshold: 80.0,
            bucket_width: Duration::from_secs(10 * 60),
            window_size: 10,
            breach_limit: 10,
        }
    }
}

impl PipelineConfig {
    /// Field and display names for a single channel.
    pub fn channel(&self, channel: Channel) -> &ChannelSpec {
        &self.channels[channel.index()]
    }

    /// Bucket width as a chrono duration, saturating for widths chrono cannot hold.
    pub fn bucket_span(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.bucket_width).unwrap_or(chrono::Duration::MAX)
    }

    /// Check that the configuration can drive a pipeline run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_width.as_secs() == 0 {
            return Err(ConfigError::Invalid(
                "bucket width must be at least one minute".to_string(),
            ));
        }
        if self.bucket_width > MAX_BUCKET_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "bucket width must be at most {} minutes",
                MAX_BUCKET_WIDTH.as_secs() / 60
            )));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window size must be positive".to_string()));
        }
        if self.breach_limit == 0 {
            return Err(ConfigError::Invalid("breach limit must be positive".to_string()));
        }
        if !self.breach_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "breach threshold must be a finite number".to_string(),
            ));
        }

        let mut fields: Vec<&str> = vec![self.timestamp_field.trim()];
        fields.extend(self.channels.iter().map(|c| c.field.trim()));
        if fields.iter().any(|f| f.is_empty()) {
            return Err(ConfigError::Invalid("field names must not be empty".to_string()));
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[i + 1..].contains(field) {
                return Err(ConfigError::Invalid(format!(
                    "field name '{field}' is used more than once"
                )));
            }
        }

        Ok(())
    }
}

/// Where raw rows are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A JSON array of row objects on disk
    File { path: PathBuf },
    /// A remote tabular store reached by sheet name
    Remote {
        base_url: String,
        sheet: String,
        token: String,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::File {
            path: PathBuf::from("records.json"),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole minutes.
mod minutes_serde {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_secs() / 60).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let minutes = u64::deserialize(deserializer)?;
        minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| de::Error::custom(format!("{minutes} minutes is out of range")))
    }
}
