//! Serializable run configuration.
//!
//! Every parameter of a report run lives here and is loaded from TOML, so a
//! scheduler can point the binary at a different window, store or column
//! layout without a rebuild.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use xetra_core::SourceColumns;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_KEY_PREFIX: &str = "xetra_daily_report_";
pub const DEFAULT_KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DEFAULT_LEDGER_KEY: &str = "meta_file.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete parameter set for a daily report run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// First source date eligible for processing (inclusive).
    pub reference_date: NaiveDate,

    /// Last source date eligible for processing (inclusive). Defaults to the
    /// run's local date.
    #[serde(default)]
    pub today: Option<NaiveDate>,

    /// strftime layout of dates in source keys, source rows and the ledger.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub store: StoreConfig,

    pub source: SourceConfig,

    pub target: TargetConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub columns: SourceColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Root directory of the filesystem object store.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub container: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    pub container: String,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_key_timestamp_format")]
    pub key_timestamp_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    /// Ledger object key inside the target container.
    pub key: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_LEDGER_KEY.to_string(),
        }
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_key_timestamp_format() -> String {
    DEFAULT_KEY_TIMESTAMP_FORMAT.to_string()
}

impl ReportConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ReportConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.container.trim().is_empty() {
            return Err(ConfigError::Invalid("source.container is empty".into()));
        }
        if self.target.container.trim().is_empty() {
            return Err(ConfigError::Invalid("target.container is empty".into()));
        }
        if self.ledger.key.trim().is_empty() {
            return Err(ConfigError::Invalid("ledger.key is empty".into()));
        }
        if let Some(name) = self.columns.names().iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "column names must not be empty (got '{name}')"
            )));
        }

        check_date_format("date_format", &self.date_format, self.reference_date)?;
        check_timestamp_format("target.key_timestamp_format", &self.target.key_timestamp_format)?;

        if let Some(today) = self.today {
            if today < self.reference_date {
                return Err(ConfigError::Invalid(format!(
                    "today ({today}) is before reference_date ({})",
                    self.reference_date
                )));
            }
        }
        Ok(())
    }

    /// Inclusive end of the planning window.
    pub fn end_date(&self, local_today: NaiveDate) -> NaiveDate {
        self.today.unwrap_or(local_today)
    }
}

fn has_invalid_items(format: &str) -> bool {
    StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// A date format must be valid strftime and parse back what it formats.
fn check_date_format(field: &str, format: &str, sample: NaiveDate) -> Result<(), ConfigError> {
    if format.is_empty() || has_invalid_items(format) {
        return Err(ConfigError::Invalid(format!("{field} '{format}' is not a valid format")));
    }
    let rendered = sample.format(format).to_string();
    match NaiveDate::parse_from_str(&rendered, format) {
        Ok(parsed) if parsed == sample => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "{field} '{format}' does not identify a calendar date"
        ))),
    }
}

fn check_timestamp_format(field: &str, format: &str) -> Result<(), ConfigError> {
    if format.is_empty() || has_invalid_items(format) {
        return Err(ConfigError::Invalid(format!("{field} '{format}' is not a valid format")));
    }
    Ok(())
}

/// Target key for a report written at `now`.
pub fn report_key(target: &TargetConfig, now: NaiveDateTime) -> String {
    format!(
        "{}{}.parquet",
        target.key_prefix,
        now.format(&target.key_timestamp_format)
    )
}
