use facecap_core::provider::DEFAULT_MATCH_THRESHOLD;
use facecap_core::storage::DEFAULT_FACES_DIR;
use facecap_core::DetectionModel;
use facecap_hw::DEFAULT_DEVICE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Runtime configuration: defaults, then an optional TOML file, then
/// `FACECAP_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory with one subdirectory of images per person.
    pub faces_dir: PathBuf,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Cosine similarity at or above which two faces match.
    pub match_threshold: f32,
    /// Detection model used when encoding stored images.
    pub enroll_model: DetectionModel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            faces_dir: PathBuf::from(DEFAULT_FACES_DIR),
            camera_device: DEFAULT_DEVICE.to_string(),
            model_dir: default_model_dir(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            enroll_model: DetectionModel::Fast,
        }
    }
}

impl Config {
    /// Load configuration from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `FACECAP_*` variables. Unparseable values are
    /// ignored and the current value kept.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("FACECAP_FACES_DIR") {
            self.faces_dir = PathBuf::from(dir);
        }
        if let Some(device) = lookup("FACECAP_CAMERA_DEVICE") {
            self.camera_device = device;
        }
        if let Some(dir) = lookup("FACECAP_MODEL_DIR") {
            self.model_dir = PathBuf::from(dir);
        }
        self.match_threshold = parse_or(lookup("FACECAP_MATCH_THRESHOLD"), self.match_threshold);
        self.enroll_model = parse_or(lookup("FACECAP_ENROLL_MODEL"), self.enroll_model);
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, current: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(current)
}

/// `$XDG_DATA_HOME/facecap/models`, falling back to `~/.local/share`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facecap")
        .join("models")
}
