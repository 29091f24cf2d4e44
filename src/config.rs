//! Runtime settings.
//!
//! Defaults target the published WGI workbook. A YAML file can override any
//! field, and a few environment variables override the file:
//!
//! ```yaml
//! url: https://www.worldbank.org/content/dam/sites/govindicators/doc/wgidataset_excel.zip
//! workbook_pattern: "*.xlsx"
//! skip_rows: 13
//! timeout_secs: 300
//! max_retries: 3
//! backoff_ms: 500
//! variables: [estimate, stddev, nsource, pctrank, pctranklower, pctrankupper]
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Variable;

pub const DEFAULT_URL: &str =
    "https://www.worldbank.org/content/dam/sites/govindicators/doc/wgidataset_excel.zip";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the dataset archive is published.
    pub url: String,
    /// Glob for the workbook inside the extracted archive.
    pub workbook_pattern: String,
    /// Title rows above the two-row column header on each indicator sheet.
    pub skip_rows: usize,
    pub timeout_secs: Option<u64>,
    pub max_retries: u32,
    pub backoff_ms: u64,
    /// Variables expected on every sheet and kept by the reshape.
    pub variables: Vec<Variable>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            workbook_pattern: "*.xlsx".to_string(),
            skip_rows: 13,
            timeout_secs: Some(300),
            max_retries: 3,
            backoff_ms: 500,
            variables: Variable::ALL.to_vec(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Resolve settings: explicit file, else `$WGI_CONFIG`, else defaults;
    /// then apply `WGI_URL` and `WGI_TIMEOUT_SECS`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = env::var_os("WGI_CONFIG").map(PathBuf::from);
        let mut cfg = match path.or(from_env.as_deref()) {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|k| env::var(k).ok())?;
        Ok(cfg)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WGI_URL").filter(|u| !u.trim().is_empty()) {
            self.url = url;
        }
        if let Some(raw) = lookup("WGI_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: "WGI_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            self.timeout_secs = if secs == 0 { None } else { Some(secs) };
        }
        Ok(())
    }
}
