use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;

/// Why a chat-completion call produced no text.
#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Unable to parse JSON from the API: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("API response contained no generated text")]
    EmptyResponse,

    #[error("Stream did not finish within {0:?}")]
    StreamTimeout(Duration),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("No API key provided. Use --api-key, set api_key in the config file, or set GROQ_API_KEY")]
    MissingApiKey,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
