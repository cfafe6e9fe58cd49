//! Operator configuration (`ome.toml`).
//!
//! Defines the typed configuration for the `ome` command: default output
//! format, merge strictness and the acceptance policy used to decide whether
//! a merged document leaves draft status.

use std::fmt;
use std::path::Path;

use ome_core::AcceptancePolicy;
use ome_core::schema;
use serde::Deserialize;

use crate::format::OutputFormat;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "OME_CONFIG";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ome.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Missing fields use defaults. Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OmeConfig {
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Merge settings.
    #[serde(default)]
    pub merge: MergeConfig,

    /// What a merged document needs to leave draft status.
    #[serde(default)]
    pub acceptance: AcceptanceConfig,
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Format used when `--format` is not given (default: `json`).
    #[serde(default)]
    pub format: OutputFormat,
}

// ---------------------------------------------------------------------------
// MergeConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Fail the command when the merged document still has conflicts.
    #[serde(default)]
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// AcceptanceConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptanceConfig {
    /// Field keys that must hold a value.
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,

    /// Require at least one investigator record.
    #[serde(default = "default_require_investigator")]
    pub require_investigator: bool,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            required_fields: default_required_fields(),
            require_investigator: default_require_investigator(),
        }
    }
}

fn default_required_fields() -> Vec<String> {
    AcceptancePolicy::default().required_fields
}

const fn default_require_investigator() -> bool {
    true
}

impl AcceptanceConfig {
    /// The engine policy described by this section.
    #[must_use]
    pub fn policy(&self) -> AcceptancePolicy {
        AcceptancePolicy {
            required_fields: self.required_fields.clone(),
            require_investigator: self.require_investigator,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl OmeConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields all defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found), invalid
    /// TOML, unknown fields or unknown required field keys.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields or unknown
    /// required field keys.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let unknown: Vec<&str> = self
            .acceptance
            .required_fields
            .iter()
            .map(String::as_str)
            .filter(|key| !schema::is_field_key(key))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        Err(ConfigError {
            path: None,
            message: format!(
                "acceptance.required_fields names unknown field(s): {}",
                unknown.join(", ")
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
