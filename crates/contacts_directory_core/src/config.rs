//! Runtime configuration for the directory engine.
//!
//! # Responsibility
//! - Describe the contacts-service identity used for reserved directories.
//! - Locate the catalog database and logging output.
//!
//! # Invariants
//! - Missing JSON keys fall back to `DirectoryConfig::default()` values.
//! - `validate()` runs on every load path.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default owner package of the reserved local directories.
pub const DEFAULT_CONTACTS_PACKAGE: &str = "com.example.contacts";
/// Default authority of the local contacts service.
pub const DEFAULT_LOCAL_AUTHORITY: &str = "com.example.contacts.provider";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Package recorded as owner of the reserved directories.
    pub contacts_package: String,
    /// Authority recorded for the reserved directories.
    pub local_authority: String,
    /// Catalog database file. In-memory when absent.
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files. Logging stays off when absent.
    pub log_dir: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            contacts_package: DEFAULT_CONTACTS_PACKAGE.to_string(),
            local_authority: DEFAULT_LOCAL_AUTHORITY.to_string(),
            database_path: None,
            log_level: None,
            log_dir: None,
        }
    }
}

impl DirectoryConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contacts_package.trim().is_empty() {
            return Err(ConfigError::Invalid("contacts_package must not be empty"));
        }
        if self.local_authority.trim().is_empty() {
            return Err(ConfigError::Invalid("local_authority must not be empty"));
        }
        Ok(())
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
