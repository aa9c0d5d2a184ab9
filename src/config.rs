//! Effective configuration: CLI flags merged with `~/.readcraft-config.toml`
//! and the environment.

use crate::cli::CliArgs;
use crate::client::Mode;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
pub const CONFIG_FILE_NAME: &str = ".readcraft-config.toml";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Defaults read from the user's TOML config file. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Loads the config file at `path`. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub output_dir: Option<PathBuf>,
    pub paths: Vec<PathBuf>,
    pub emit_json: bool,
    pub mode: Mode,
    pub token_usage: bool,
    pub recursive: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Merges the three configuration sources.
///
/// API key: flag, then config file, then `GROQ_API_KEY`. Model: flag, then
/// config file, then [`DEFAULT_MODEL`]. Output directory: flag, then config file.
pub fn resolve(
    cli: &CliArgs,
    file: &FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let api_key = non_empty(cli.api_key.clone())
        .or_else(|| non_empty(file.api_key.clone()))
        .or_else(|| non_empty(env(API_KEY_ENV)))
        .ok_or(ConfigError::MissingApiKey)?;

    let model = cli
        .model
        .clone()
        .or_else(|| file.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(Config {
        api_key,
        model,
        output_dir: cli.output_dir.clone().or_else(|| file.output_dir.clone()),
        paths: cli.paths.clone(),
        emit_json: cli.json,
        mode: if cli.stream { Mode::Streaming } else { Mode::Sync },
        token_usage: cli.token_usage,
        recursive: cli.recursive,
    })
}

/// Creates the output directory and its parents if needed.
pub async fn prepare_output_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}
