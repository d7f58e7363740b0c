use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "BOX_ANNOTATE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "box-annotate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("failed to parse config {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_predict_url")]
    pub predict_url: String,
    #[serde(default = "default_field_name")]
    pub field_name: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
}

fn default_predict_url() -> String {
    "http://127.0.0.1:5000/predict".to_string()
}

fn default_field_name() -> String {
    "image".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_window_width() -> f32 {
    1200.0
}

fn default_window_height() -> f32 {
    800.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            predict_url: default_predict_url(),
            field_name: default_field_name(),
            request_timeout_secs: default_request_timeout_secs(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Config {
    /// `$BOX_ANNOTATE_CONFIG`, else `box-annotate.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&data).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let cfg = Config::parse("predict_url = \"http://detector:8080/predict\"\nrequest_timeout_secs = 5\n")
            .unwrap();
        assert_eq!(cfg.predict_url, "http://detector:8080/predict");
        assert_eq!(cfg.request_timeout_secs, 5);
        assert_eq!(cfg.field_name, "image");
        assert_eq!(cfg.window_width, 1200.0);
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(Config::parse("request_timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("box-annotate-does-not-exist.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
