//! Configuration loading and data folder resolution
//!
//! Settings resolve with priority: command-line argument → environment
//! variable (`SOILSCAN_*`) → TOML config file → compiled default. A value
//! found in more than one source logs a warning and uses the highest
//! priority source.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Default inference endpoint (HuggingFace hosted inference)
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models/";

/// Default image classification model
pub const DEFAULT_MODEL_ID: &str = "google/vit-base-patch16-224";

/// Base delay between inference retry attempts (milliseconds)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Upload size cap (5 MB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 5740;

/// On-disk TOML configuration (all fields optional; absent fields fall
/// back to env/default resolution)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api_token: Option<String>,
    pub model_id: Option<String>,
    pub inference_url: Option<String>,
    pub retry_delay_ms: Option<u64>,
    pub max_image_bytes: Option<u64>,
    pub archive_url: Option<String>,
    pub archive_key: Option<String>,
    pub data_folder: Option<PathBuf>,
    pub port: Option<u16>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Inference service credential; `None` selects demo mode
    pub api_token: Option<String>,
    /// Model identifier appended to `inference_url`
    pub model_id: String,
    /// Inference service base URL
    pub inference_url: String,
    /// Base retry delay for the inference client (milliseconds)
    pub retry_delay_ms: u64,
    /// Maximum accepted upload size in bytes
    pub max_image_bytes: u64,
    /// Optional remote archive base URL
    pub archive_url: Option<String>,
    /// Optional remote archive credential
    pub archive_key: Option<String>,
    /// Folder holding local persisted state (history.json)
    pub data_folder: PathBuf,
    /// HTTP listen port
    pub port: u16,
}

/// Command-line overrides (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub data_folder: Option<PathBuf>,
    pub port: Option<u16>,
}

impl ServiceConfig {
    /// Resolve the full configuration from CLI → env → TOML → defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let toml_config = load_toml_config(cli.config_path.as_deref())?;

        let api_token = resolve_secret(
            "SOILSCAN_API_TOKEN",
            toml_config.api_token.as_deref(),
            "inference API token",
        );
        let archive_key = resolve_secret(
            "SOILSCAN_ARCHIVE_KEY",
            toml_config.archive_key.as_deref(),
            "archive key",
        );

        let model_id = std::env::var("SOILSCAN_MODEL_ID")
            .ok()
            .or(toml_config.model_id)
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let inference_url = std::env::var("SOILSCAN_INFERENCE_URL")
            .ok()
            .or(toml_config.inference_url)
            .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string());

        let archive_url = std::env::var("SOILSCAN_ARCHIVE_URL")
            .ok()
            .or(toml_config.archive_url);

        let retry_delay_ms = toml_config.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS);
        let max_image_bytes = toml_config
            .max_image_bytes
            .unwrap_or(DEFAULT_MAX_IMAGE_BYTES);

        let data_folder = cli
            .data_folder
            .clone()
            .or_else(|| std::env::var("SOILSCAN_DATA_FOLDER").ok().map(PathBuf::from))
            .or(toml_config.data_folder)
            .unwrap_or_else(default_data_folder);

        let port = cli
            .port
            .or_else(|| {
                std::env::var("SOILSCAN_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
            })
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        if api_token.is_some() {
            info!("Inference API token configured; real-service mode");
        } else {
            warn!("No inference API token configured; running in demo mode");
        }

        Ok(Self {
            api_token,
            model_id,
            inference_url,
            retry_delay_ms,
            max_image_bytes,
            archive_url,
            archive_key,
            data_folder,
            port,
        })
    }

    /// Create the data folder if missing
    pub fn ensure_data_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_folder).map_err(|e| {
            Error::Config(format!(
                "Failed to create data folder {}: {}",
                self.data_folder.display(),
                e
            ))
        })
    }

    /// Path of the local history blob
    pub fn history_path(&self) -> PathBuf {
        self.data_folder.join("history.json")
    }
}

/// Resolve a credential from env then TOML, warning when both are set
fn resolve_secret(env_var: &str, toml_value: Option<&str>, what: &str) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());
    let toml_value = toml_value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both {} and TOML config; using environment",
            what, env_var
        );
    }

    env_value.or(toml_value)
}

/// Load the TOML config file; an absent file yields defaults
fn load_toml_config(explicit_path: Option<&std::path::Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        if explicit_path.is_some() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Platform config file location (~/.config/soilscan/soilscan.toml on Linux)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("soilscan").join("soilscan.toml"))
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("soilscan"))
        .unwrap_or_else(|| PathBuf::from("./soilscan_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_config_file() {
        let config = ServiceConfig::resolve(&CliOverrides {
            config_path: None,
            data_folder: Some(PathBuf::from("/tmp/soilscan-test")),
            port: None,
        })
        .unwrap();

        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.inference_url, DEFAULT_INFERENCE_URL);
        assert_eq!(config.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert_eq!(config.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
    }

    #[test]
    fn cli_port_wins_over_default() {
        let config = ServiceConfig::resolve(&CliOverrides {
            config_path: None,
            data_folder: Some(PathBuf::from("/tmp/soilscan-test")),
            port: Some(9999),
        })
        .unwrap();

        assert_eq!(config.port, 9999);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soilscan.toml");
        std::fs::write(
            &path,
            "model_id = \"custom/model\"\nretry_delay_ms = 50\nport = 6001\n",
        )
        .unwrap();

        let config = ServiceConfig::resolve(&CliOverrides {
            config_path: Some(path),
            data_folder: Some(dir.path().to_path_buf()),
            port: None,
        })
        .unwrap();

        assert_eq!(config.model_id, "custom/model");
        assert_eq!(config.retry_delay_ms, 50);
        assert_eq!(config.port, 6001);
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let result = ServiceConfig::resolve(&CliOverrides {
            config_path: Some(PathBuf::from("/nonexistent/soilscan.toml")),
            data_folder: None,
            port: None,
        });

        assert!(result.is_err());
    }

    #[test]
    fn history_path_is_under_data_folder() {
        let config = ServiceConfig {
            api_token: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            archive_url: None,
            archive_key: None,
            data_folder: PathBuf::from("/var/lib/soilscan"),
            port: DEFAULT_PORT,
        };

        assert_eq!(
            config.history_path(),
            PathBuf::from("/var/lib/soilscan/history.json")
        );
    }
}
