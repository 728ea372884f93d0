//! Configuration for locating the exports to audit.
//!
//! The checks themselves have no tunable thresholds; configuration only says
//! where the three NDJSON sources live.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the receipt, user and brand exports are read from.
///
/// Use [`AuditConfig::builder()`] to create a configuration with the fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use rewards_audit::AuditConfig;
///
/// let config = AuditConfig::builder()
///     .data_dir("exports/2021-03")
///     .receipts_file("receipts.json")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Directory holding the exports.
    /// Default: "." (current directory)
    pub data_dir: PathBuf,

    /// Receipts export file name, relative to `data_dir`.
    /// Default: "receipts.json"
    pub receipts_file: String,

    /// Users export file name, relative to `data_dir`.
    /// Default: "users.json"
    pub users_file: String,

    /// Brands export file name, relative to `data_dir`.
    /// Default: "brands.json"
    pub brands_file: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            receipts_file: "receipts.json".to_string(),
            users_file: "users.json".to_string(),
            brands_file: "brands.json".to_string(),
        }
    }
}

impl AuditConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    pub fn receipts_path(&self) -> PathBuf {
        self.data_dir.join(&self.receipts_file)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn brands_path(&self) -> PathBuf {
        self.data_dir.join(&self.brands_file)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("receipts_file", &self.receipts_file),
            ("users_file", &self.users_file),
            ("brands_file", &self.brands_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyFileName(field.to_string()));
            }
        }

        if self.receipts_file == self.users_file
            || self.receipts_file == self.brands_file
            || self.users_file == self.brands_file
        {
            return Err(ConfigValidationError::SharedFileName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("File name for '{0}' must not be empty")]
    EmptyFileName(String),

    #[error("Receipts, users and brands must be read from distinct files")]
    SharedFileName,
}

/// Builder for [`AuditConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AuditConfigBuilder {
    data_dir: Option<PathBuf>,
    receipts_file: Option<String>,
    users_file: Option<String>,
    brands_file: Option<String>,
}

impl AuditConfigBuilder {
    /// Set the directory the exports are read from.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn receipts_file(mut self, name: impl Into<String>) -> Self {
        self.receipts_file = Some(name.into());
        self
    }

    pub fn users_file(mut self, name: impl Into<String>) -> Self {
        self.users_file = Some(name.into());
        self
    }

    pub fn brands_file(mut self, name: impl Into<String>) -> Self {
        self.brands_file = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AuditConfig` or an error if validation fails.
    pub fn build(self) -> Result<AuditConfig, ConfigValidationError> {
        let defaults = AuditConfig::default();
        let config = AuditConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            receipts_file: self.receipts_file.unwrap_or(defaults.receipts_file),
            users_file: self.users_file.unwrap_or(defaults.users_file),
            brands_file: self.brands_file.unwrap_or(defaults.brands_file),
        };

        config.validate()?;
        Ok(config)
    }
}
