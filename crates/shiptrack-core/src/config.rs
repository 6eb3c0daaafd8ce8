use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INPUT_PATH: &str = "data/raw/shipments.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/cleaned/shipments_cleaned.csv";
pub const DEFAULT_LOG_DIRECTORY: &str = "data/logs";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/sqlite/shipments.db";
pub const DATABASE_URL_VARS: [&str; 2] = ["SHIPTRACK_DATABASE_URL", "DATABASE_URL"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duration band is inverted: min_days {min_days} > max_days {max_days}")]
    InvertedDurationBand { min_days: i64, max_days: i64 },
    #[error("sla_days must be non-negative, got {0}")]
    NegativeSla(i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

/// Inclusive range of plausible delivery durations, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationBand {
    pub min_days: i64,
    pub max_days: i64,
}

impl Default for DurationBand {
    fn default() -> Self {
        Self {
            min_days: 1,
            max_days: 10,
        }
    }
}

impl DurationBand {
    pub fn contains(&self, days: i64) -> bool {
        (self.min_days..=self.max_days).contains(&days)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub log_directory: PathBuf,
    pub output_format: OutputFormat,
    pub duration_band: DurationBand,
    /// Reassigned ids start above `max(observed max id, id_floor)`.
    pub id_floor: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            log_directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
            output_format: OutputFormat::default(),
            duration_band: DurationBand::default(),
            id_floor: 0,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_band.min_days > self.duration_band.max_days {
            return Err(ConfigError::InvertedDurationBand {
                min_days: self.duration_band.min_days,
                max_days: self.duration_band.max_days,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub database_url: String,
    /// Deliveries taking more than this many days count as late.
    pub sla_days: i64,
    pub route_limit: i64,
    pub export_directory: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            sla_days: 4,
            route_limit: 5,
            export_directory: None,
        }
    }
}

impl ReportConfig {
    /// Replaces the database URL with the first of `DATABASE_URL_VARS` that is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = DATABASE_URL_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok())
        {
            self.database_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sla_days < 0 {
            return Err(ConfigError::NegativeSla(self.sla_days));
        }
        Ok(())
    }
}

/// Top-level config file: a `[pipeline]` table and a `[report]` table, both optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiptrackConfig {
    pub pipeline: PipelineConfig,
    pub report: ReportConfig,
}

impl ShiptrackConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ShiptrackConfig = toml::from_str(toml_str)?;
        config.pipeline.validate()?;
        config.report.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
