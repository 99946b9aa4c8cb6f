//! Run configuration
//!
//! Built in three layers: defaults, an optional YAML file, then CLI flags.
//! The resulting [`AnalysisConfig`] is passed explicitly into the pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::group::{GroupKey, InvalidGroupKeyError};
use crate::core::limits::LimitTable;
use crate::core::parameter::{InvalidParameterError, ParameterSelection};
use crate::parser::RowPolicy;

pub const DEFAULT_DATA_DIR: &str = "./data/data2/rawdata";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Report artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Interactive HTML report per parameter
    #[default]
    Html,
    /// Statistics and yield tables as CSV
    Csv,
    /// One JSON summary document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Yaml { path: PathBuf, message: String },

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    #[error(transparent)]
    InvalidGroupKey(#[from] InvalidGroupKeyError),
}

/// Everything one analysis run needs
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub parameters: ParameterSelection,
    pub group_by: GroupKey,
    pub format: OutputFormat,
    pub row_policy: RowPolicy,
    /// Abort on the first file that fails to parse
    pub fail_fast: bool,
    /// Limits that take precedence over those read from the logs
    pub limit_overrides: LimitTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            parameters: ParameterSelection::default(),
            group_by: GroupKey::default(),
            format: OutputFormat::default(),
            row_policy: RowPolicy::default(),
            fail_fast: false,
            limit_overrides: LimitTable::new(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults overlaid with a YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = ConfigFile::load(path)?;
        let mut config = AnalysisConfig::default();
        file.apply_to(&mut config)?;
        Ok(config)
    }
}

/// `parameters:` accepts a single name (including `all`) or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParameterNames {
    One(String),
    Many(Vec<String>),
}

impl ParameterNames {
    fn as_slice(&self) -> &[String] {
        match self {
            ParameterNames::One(name) => std::slice::from_ref(name),
            ParameterNames::Many(names) => names,
        }
    }
}

/// On-disk shape of a config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub parameters: Option<ParameterNames>,
    pub all_parameters: Option<bool>,
    pub group_by: Option<String>,
    pub format: Option<OutputFormat>,
    pub row_policy: Option<RowPolicy>,
    pub fail_fast: Option<bool>,
    #[serde(default)]
    pub limits: LimitTable,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay the keys present in this file onto `config`
    pub fn apply_to(self, config: &mut AnalysisConfig) -> Result<(), ConfigError> {
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.all_parameters == Some(true) {
            config.parameters = ParameterSelection::All;
        } else if let Some(names) = self.parameters {
            config.parameters = ParameterSelection::from_names(names.as_slice())?;
        }
        if let Some(group_by) = self.group_by {
            config.group_by = group_by.parse()?;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(policy) = self.row_policy {
            config.row_policy = policy;
        }
        if let Some(fail_fast) = self.fail_fast {
            config.fail_fast = fail_fast;
        }
        config.limit_overrides.apply_overrides(&self.limits);
        Ok(())
    }
}
