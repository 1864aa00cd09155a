use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:8080/upload";
pub const DEFAULT_CHAT_URL: &str = "ws://localhost:8080/ws";
pub const DEFAULT_END_OF_TURN: &str = "[DONE]";
pub const DEFAULT_SIMULATED_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Live,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upload_url: String,
    pub chat_url: String,
    /// Literal frame that marks the end of an assistant turn.
    pub end_of_turn: String,
    pub mode: ChatMode,
    pub simulated_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            end_of_turn: DEFAULT_END_OF_TURN.to_string(),
            mode: ChatMode::Live,
            simulated_delay_ms: DEFAULT_SIMULATED_DELAY_MS,
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path() -> PathBuf {
    std::env::var_os("RESUME_CHAT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".resume-chat").join("config.json"))
}

fn read_config_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// Loads the config at `path`; problems fall back to defaults and come back as warnings.
pub fn load_from(path: &Path) -> (AppConfig, Vec<String>) {
    match read_config_file(path) {
        Ok(Some(config)) => (config, Vec::new()),
        Ok(None) => (AppConfig::default(), Vec::new()),
        Err(err) => (AppConfig::default(), vec![err.to_string()]),
    }
}

pub fn load() -> (AppConfig, Vec<String>) {
    load_from(&config_path())
}
