//! Layered settings

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runtime settings.
///
/// Resolved from defaults, then an optional `pathoscope.{toml,json,yaml}` in
/// the working directory, then an explicit config file, then `PATHOSCOPE_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Artifact path; relative paths are joined to `model_base_dir`
    pub model_path: PathBuf,
    pub model_base_dir: PathBuf,
    /// Further artifact candidates, tried after `model_path`
    pub fallback_model_paths: Vec<PathBuf>,
    /// Load the artifact at startup instead of on first use
    pub model_preload: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub similarity_top_n: usize,
    /// Maximum number of stored organisms ranked per query
    pub similarity_sample_limit: usize,
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("model_path", "ml_models/bacteria_classifier.json")?
            .set_default("model_base_dir", ".")?
            .set_default("fallback_model_paths", Vec::<String>::new())?
            .set_default("model_preload", true)?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?
            .set_default("similarity_top_n", 5_i64)?
            .set_default("similarity_sample_limit", 1000_i64)?
            .add_source(File::with_name("pathoscope").required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("PATHOSCOPE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("fallback_model_paths"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.similarity_top_n == 0 {
            return Err(SettingsError::Invalid {
                key: "similarity_top_n",
                reason: "must be positive".into(),
            });
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(SettingsError::Invalid {
                key: "model_path",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Artifact candidate paths in the order they are tried
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        std::iter::once(&self.model_path)
            .chain(&self.fallback_model_paths)
            .map(|p| self.model_base_dir.join(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_file_overrides_defaults() {
        let (_dir, path) = write_config(
            r#"
            model_path = "models/clf.json"
            model_base_dir = "/srv/app"
            fallback_model_paths = ["/opt/models/clf.json"]
            model_preload = false
            log_format = "json"
            similarity_top_n = 3
            "#,
        );

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(!settings.model_preload);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.similarity_top_n, 3);
        assert_eq!(settings.similarity_sample_limit, 1000);
        assert_eq!(
            settings.candidate_paths(),
            vec![
                PathBuf::from("/srv/app/models/clf.json"),
                PathBuf::from("/opt/models/clf.json"),
            ]
        );
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let (_dir, path) = write_config("similarity_top_n = 0\n");
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "similarity_top_n", .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Config(_)));
    }
}
