//! Configuration management for trialseal
//!
//! Values are layered: built-in defaults, then the JSON config file, then
//! `TRIALSEAL_*` environment variables.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrialsealError};
use crate::loader::StagingConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Trial length used by `protect` when `--days` is not given
    #[serde(default = "default_trial_days")]
    pub default_trial_days: i64,
    /// Suffix of transient copies when the source has no extension
    #[serde(default = "default_transient_suffix")]
    pub transient_suffix: String,
    /// Directory for transient copies, system temp dir when unset
    #[serde(default)]
    pub transient_dir: Option<PathBuf>,
    /// File extensions treated as model artifacts when scanning directories
    #[serde(default = "default_artifact_extensions")]
    pub artifact_extensions: Vec<String>,
    #[serde(default)]
    pub verbose: bool,
}

fn default_trial_days() -> i64 {
    60
}

fn default_transient_suffix() -> String {
    ".onnx".to_string()
}

fn default_artifact_extensions() -> Vec<String> {
    vec!["onnx".to_string()]
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            default_trial_days: default_trial_days(),
            transient_suffix: default_transient_suffix(),
            transient_dir: None,
            artifact_extensions: default_artifact_extensions(),
            verbose: false,
        }
    }
}

impl TrialConfig {
    /// Load from `config_path`, or from the default location when `None`
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(TrialsealError::file_not_found(path.display().to_string()));
                }
                Self::from_file_and_env(Some(path))
            }
            None => Self::from_file_and_env(Some(default_config_path().as_path())),
        }
    }

    pub fn from_file_and_env(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("default_trial_days", default_trial_days())?
            .set_default("transient_suffix", default_transient_suffix())?
            .set_default("artifact_extensions", default_artifact_extensions())?
            .set_default("verbose", false)?;

        if let Some(config_path) = config_file {
            builder = builder.add_source(
                File::from(config_path)
                    .format(FileFormat::Json)
                    .required(false),
            );
        }
        builder = builder.add_source(Environment::with_prefix("TRIALSEAL").try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.transient_suffix.starts_with('.') || self.transient_suffix.len() < 2 {
            return Err(TrialsealError::config(format!(
                "transient_suffix must look like '.onnx', got '{}'",
                self.transient_suffix
            )));
        }
        if self.artifact_extensions.is_empty() {
            return Err(TrialsealError::config(
                "artifact_extensions cannot be empty",
            ));
        }
        Ok(())
    }

    /// Staging settings for a [`crate::GatedLoader`]
    pub fn staging(&self) -> StagingConfig {
        StagingConfig {
            dir: self.transient_dir.clone(),
            default_suffix: self.transient_suffix.clone(),
        }
    }

    pub fn is_artifact_extension(&self, ext: &str) -> bool {
        self.artifact_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trialseal")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = create_temp_dir();
        let config = TrialConfig::from_file_and_env(Some(dir.path().join("absent.json").as_path())).unwrap();

        assert_eq!(config.default_trial_days, 60);
        assert_eq!(config.transient_suffix, ".onnx");
        assert!(config.transient_dir.is_none());
        assert!(config.is_artifact_extension("ONNX"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = create_temp_dir();
        let path = create_temp_file_with_content(
            &dir,
            "config.json",
            br#"{"default_trial_days": 14, "transient_dir": "/var/tmp/models", "artifact_extensions": ["onnx", "ort"]}"#,
        );

        let config = TrialConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.default_trial_days, 14);
        assert_eq!(config.transient_dir, Some(PathBuf::from("/var/tmp/models")));
        assert!(config.is_artifact_extension("ort"));

        let staging = config.staging();
        assert_eq!(staging.dir, Some(PathBuf::from("/var/tmp/models")));
        assert_eq!(staging.default_suffix, ".onnx");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = create_temp_dir();
        assert!(TrialConfig::load(Some(dir.path().join("nope.json").as_path())).is_err());
    }

    #[test]
    fn test_invalid_suffix_rejected() {
        let config = TrialConfig {
            transient_suffix: "onnx".to_string(),
            ..TrialConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(TrialConfig::default().validate().is_ok());
    }
}
