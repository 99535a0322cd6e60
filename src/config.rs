use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BRANDS_FILE, CONSUMER_ROLE, DEFAULT_CONFIG_FILE, DEFAULT_SAMPLE_SIZE, RECEIPTS_FILE,
    RECEIPT_STATUSES, USERS_DEFAULT_SKIP_LINES, USERS_FILE,
};
use crate::domain::lenient::parse_timestamp;
use crate::domain::Dataset;
use crate::error::{QualityError, Result};
use crate::pipeline::processing::quality_gate::CheckKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub datasets: DatasetsConfig,
    pub checks: ChecksConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    /// Directory the default file names are resolved against
    pub data_dir: PathBuf,
    pub receipts: SourceConfig,
    pub brands: SourceConfig,
    pub users: SourceConfig,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            receipts: SourceConfig::default(),
            brands: SourceConfig::default(),
            users: SourceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_lines: Option<usize>,
}

/// A dataset's file location and leading-line skip after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub dataset: Dataset,
    pub path: PathBuf,
    pub skip_lines: usize,
}

impl DatasetsConfig {
    pub fn source(&self, dataset: Dataset) -> &SourceConfig {
        match dataset {
            Dataset::Receipts => &self.receipts,
            Dataset::Brands => &self.brands,
            Dataset::Users => &self.users,
        }
    }

    pub fn source_mut(&mut self, dataset: Dataset) -> &mut SourceConfig {
        match dataset {
            Dataset::Receipts => &mut self.receipts,
            Dataset::Brands => &mut self.brands,
            Dataset::Users => &mut self.users,
        }
    }

    pub fn resolve(&self, dataset: Dataset) -> ResolvedSource {
        let source = self.source(dataset);
        let (default_file, default_skip) = match dataset {
            Dataset::Receipts => (RECEIPTS_FILE, 0),
            Dataset::Brands => (BRANDS_FILE, 0),
            Dataset::Users => (USERS_FILE, USERS_DEFAULT_SKIP_LINES),
        };
        ResolvedSource {
            dataset,
            path: source
                .path
                .clone()
                .unwrap_or_else(|| self.data_dir.join(default_file)),
            skip_lines: source.skip_lines.unwrap_or(default_skip),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Columns whose null fraction is strictly above this are reported
    pub null_threshold: f64,
    /// Cut-off for the future-date checks (`YYYY-MM-DD HH:MM:SS`, UTC); now when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<String>,
    /// Checks whose violations fail the run
    pub fatal: Vec<CheckKind>,
    /// Offending record ids quoted per finding
    pub sample_size: usize,
    pub allowed_receipt_statuses: Vec<String>,
    pub allowed_roles: Vec<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            null_threshold: 0.0,
            reference_time: None,
            fatal: Vec::new(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            allowed_receipt_statuses: RECEIPT_STATUSES.iter().map(|s| s.to_string()).collect(),
            allowed_roles: vec![CONSUMER_ROLE.to_string()],
        }
    }
}

impl ChecksConfig {
    pub fn reference_time(&self) -> Result<Option<NaiveDateTime>> {
        match &self.reference_time {
            None => Ok(None),
            Some(raw) => parse_timestamp(raw).map(Some).ok_or_else(|| {
                QualityError::Config(format!(
                    "reference_time '{}' is not in YYYY-MM-DD HH:MM:SS form",
                    raw
                ))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    /// Also write JSON logs to a daily rolling file
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_output: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| QualityError::io(path, e))?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise `quality.toml` is used when present
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.checks.null_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(QualityError::Config(format!(
                "null_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.checks.allowed_roles.is_empty() {
            return Err(QualityError::Config("allowed_roles must not be empty".to_string()));
        }
        if let Some(kind) = self.checks.fatal.iter().find(|kind| !kind.can_flag()) {
            return Err(QualityError::Config(format!(
                "'{}' only profiles the data and cannot be listed in fatal",
                kind
            )));
        }
        self.checks.reference_time()?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
