//! Configuration file support for namematch.
//!
//! A config document carries a format `version` and a `matcher` section
//! holding [`MatcherConfig`] fields. YAML and JSON are both accepted; every
//! matcher field is optional and falls back to its default.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "retry-full-name"
//!
//! matcher:
//!   source_path: "data/full_names.json"
//!   min_document_frequency: 1
//!   neighbor_count: 5
//!   persistence_path: "ai-models/matcher.mdl"
//!   analyzer:
//!     min_n: 2
//!     max_n: 3
//! ```
//!
//! The older flat layout, with `source_file`, `min_df`, `n_neighbors` and
//! `out_file` at the top level, is still read (see
//! [`NameMatchConfig::from_str_with`]).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use matcher::MatcherConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Document syntax of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Guess the format from a file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(format!("unknown config format `{other}` (expected yaml or json)")),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Yaml => f.write_str("yaml"),
            ConfigFormat::Json => f.write_str("json"),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NameMatchConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Matcher configuration
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl NameMatchConfig {
    /// Load a config file, inferring the format from its extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let format = ConfigFormat::from_path(path.as_ref());
        Self::from_file_with(path, format)
    }

    /// Load a config file in an explicit format.
    pub fn from_file_with<P: AsRef<Path>>(
        path: P,
        format: ConfigFormat,
    ) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_str_with(&content, format)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        Self::from_str_with(yaml, ConfigFormat::Yaml)
    }

    /// Parse JSON configuration from a string
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        Self::from_str_with(json, ConfigFormat::Json)
    }

    /// Parse a document in `format`.
    ///
    /// A document without a `version` key is read in the flat layout,
    /// where the matcher fields sit at the top level under their short
    /// names (`source_file`, `min_df`, `n_neighbors`, `out_file`). Any
    /// other key in a flat document is an error, and a `matcher` section
    /// requires a `version`.
    pub fn from_str_with(content: &str, format: ConfigFormat) -> Result<Self, ConfigLoadError> {
        let value: serde_json::Value = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        let config = match (value.get("version"), value.get("matcher")) {
            (Some(_), _) => serde_json::from_value::<NameMatchConfig>(value)?,
            (None, Some(_)) => {
                return Err(ConfigLoadError::Validation(
                    "a config with a `matcher` section must declare `version`".into(),
                ))
            }
            (None, None) => serde_json::from_value::<FlatConfig>(value)?.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty JSON, as printed by `namematch fit --print`.
    pub fn to_json_pretty(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))
    }
}

impl Default for NameMatchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            matcher: MatcherConfig::default(),
        }
    }
}

/// Flat, unversioned layout with short field names.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FlatConfig {
    source_file: Option<PathBuf>,
    min_df: Option<usize>,
    n_neighbors: Option<usize>,
    out_file: Option<PathBuf>,
}

impl From<FlatConfig> for NameMatchConfig {
    fn from(flat: FlatConfig) -> Self {
        let mut matcher = MatcherConfig::default();
        if let Some(path) = flat.source_file {
            matcher.source_path = path;
        }
        if let Some(min_df) = flat.min_df {
            matcher.min_document_frequency = min_df;
        }
        if let Some(count) = flat.n_neighbors {
            matcher.neighbor_count = count;
        }
        if let Some(path) = flat.out_file {
            matcher.persistence_path = path;
        }
        Self {
            matcher,
            ..Self::default()
        }
    }
}
