//! Configuration – reads/writes `~/.reverie/config.toml`.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! `REVERIE_*` environment variables override whatever was loaded:
//!
//! | Variable | Config field |
//! |---|---|
//! | `REVERIE_BASE_URL` | `base_url` |
//! | `REVERIE_COMPLETION_MODEL` | `completion_model` |
//! | `REVERIE_EMBEDDING_MODEL` | `embedding_model` |
//! | `REVERIE_API_KEY` | `api_key` |
//! | `REVERIE_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
//! | `REVERIE_REFLECTION_WINDOW` | `reflection_window` |

use std::fs;
use std::path::{Path, PathBuf};

use reverie_types::ModelSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reflection::DEFAULT_REFLECTION_WINDOW;

/// Errors raised while loading or saving the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persisted settings for the reasoner endpoint and reflection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ReverieConfig {
    /// Base URL of the OpenAI-compatible server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Bearer token; empty means no `Authorization` header.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Per-request deadline enforced by the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How many of the most recent memories a reflection pass reads.
    #[serde(default = "default_reflection_window")]
    pub reflection_window: usize,
}

impl std::fmt::Debug for ReverieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverieConfig")
            .field("base_url", &self.base_url)
            .field("completion_model", &self.completion_model)
            .field("embedding_model", &self.embedding_model)
            .field(
                "api_key",
                if self.api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("reflection_window", &self.reflection_window)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_completion_model() -> String {
    ModelSettings::default().completion_model
}
fn default_embedding_model() -> String {
    ModelSettings::default().embedding_model
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_reflection_window() -> usize {
    DEFAULT_REFLECTION_WINDOW
}

impl Default for ReverieConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            completion_model: default_completion_model(),
            embedding_model: default_embedding_model(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            reflection_window: default_reflection_window(),
        }
    }
}

impl From<&ReverieConfig> for ModelSettings {
    fn from(cfg: &ReverieConfig) -> Self {
        ModelSettings {
            completion_model: cfg.completion_model.clone(),
            embedding_model: cfg.embedding_model.clone(),
        }
    }
}

/// Return the path to `~/.reverie/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".reverie").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<ReverieConfig>, ConfigError> {
    load_from(&config_path())
}

/// Load the config from `path`, then apply environment overrides.
pub fn load_from(path: &Path) -> Result<Option<ReverieConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: ReverieConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `REVERIE_*` environment variable overrides to `cfg`.
///
/// Numeric variables that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut ReverieConfig) {
    if let Ok(v) = std::env::var("REVERIE_BASE_URL") {
        cfg.base_url = v;
    }
    if let Ok(v) = std::env::var("REVERIE_COMPLETION_MODEL") {
        cfg.completion_model = v;
    }
    if let Ok(v) = std::env::var("REVERIE_EMBEDDING_MODEL") {
        cfg.embedding_model = v;
    }
    if let Ok(v) = std::env::var("REVERIE_API_KEY") {
        cfg.api_key = v;
    }
    if let Ok(v) = std::env::var("REVERIE_REQUEST_TIMEOUT_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.request_timeout_secs = secs;
    }
    if let Ok(v) = std::env::var("REVERIE_REFLECTION_WINDOW")
        && let Ok(window) = v.parse::<usize>()
    {
        cfg.reflection_window = window;
    }
}

/// Save the config to disk, creating `~/.reverie/` if necessary.
pub fn save(cfg: &ReverieConfig) -> Result<(), ConfigError> {
    save_to(cfg, &config_path())
}

/// Save the config to `path` with owner-only permissions on Unix.
pub fn save_to(cfg: &ReverieConfig, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(write_err)?;
        }
    }
    let raw = toml::to_string_pretty(cfg)?;

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
