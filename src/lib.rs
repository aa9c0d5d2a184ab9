//! # readcraft Library
//!
//! Sends source files to a chat-completion endpoint and writes the returned
//! text as `<stem>_README.md` files (plus optional `<stem>_README.json`
//! results), or prints it to stdout.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use readcraft::{ChatClient, Config, Mode, NullSink, run_readcraft};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         api_key: "gsk_...".into(),
//!         model: readcraft::config::DEFAULT_MODEL.into(),
//!         output_dir: Some(PathBuf::from("docs")),
//!         paths: vec![PathBuf::from("src/main.py")],
//!         emit_json: false,
//!         mode: Mode::Sync,
//!         token_usage: false,
//!         recursive: false,
//!     };
//!     readcraft::config::prepare_output_dir(&PathBuf::from("docs")).await?;
//!
//!     let client = ChatClient::new(&config.api_key, &config.model)?;
//!     let outcome = run_readcraft(&config, &client, tokio::io::stdout(), &mut NullSink).await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod filewalker;
pub mod generator;
pub mod result;
pub mod source;
pub mod stream;
pub mod utils;
pub mod writer;

pub use cli::CliArgs;
pub use client::{ChatClient, Completion, Mode, Usage};
pub use config::Config;
pub use error::{ChatError, ConfigError};
pub use filewalker::collect_files;
pub use generator::{NO_CONTENT_SENTINEL, generate_readme};
pub use result::{ReadmeResult, RunOutcome, Status, overall_success};
pub use stream::{ChunkSink, NullSink};
pub use writer::ReadmeWriter;

use anyhow::Result;
use log::{error, info, warn};
use crate::source::{Source, read_source};
use tokio::io::AsyncWrite;

/// Processes every input file in order and materializes each result.
///
/// Per-file failures (unreadable file, failed API call) are recorded and the
/// run continues; only output errors abort it.
pub async fn run_readcraft<W: AsyncWrite + Unpin>(
    config: &Config,
    client: &ChatClient,
    stdout: W,
    sink: &mut dyn ChunkSink,
) -> Result<RunOutcome> {
    let mut writer = ReadmeWriter::new(config.output_dir.clone(), config.emit_json, stdout);
    let mut outcome = RunOutcome::new();

    for path in collect_files(&config.paths, config.recursive) {
        let generated = match read_source(&path) {
            Ok(Source::Binary) => {
                warn!("Skipping binary file: {}", path.display());
                continue;
            }
            Ok(Source::Text(contents)) => {
                info!("Processing file: {}", path.display());
                match generate_readme(client, &path, &contents, config.mode, sink).await {
                    Ok(text) => Some(text),
                    Err(err) => {
                        error!("{err}");
                        None
                    }
                }
            }
            Err(err) => {
                error!("{err:#}");
                None
            }
        };

        if generated.is_none() {
            error!("Failed to generate README for {}", path.display());
        }

        let result = outcome.record(&path, generated);
        writer.materialize(result).await?;
    }

    writer.finish(outcome.results()).await?;
    Ok(outcome)
}

/// Asks the API for token usage. Returns `None` (after logging why) when unavailable.
pub async fn probe_token_usage(client: &ChatClient) -> Option<Usage> {
    match client.probe_usage().await {
        Ok(Some(usage)) => Some(usage),
        Ok(None) => {
            error!("API response did not include token usage");
            None
        }
        Err(err) => {
            error!("{err}");
            None
        }
    }
}

/// Runs the tool for parsed command-line arguments and returns the process exit code.
pub async fn run_cli(args: CliArgs) -> Result<i32> {
    let file_config = match config::FileConfig::default_path() {
        Some(path) => config::FileConfig::load(&path)?,
        None => config::FileConfig::default(),
    };
    let config = config::resolve(&args, &file_config, |name| std::env::var(name).ok())?;

    if let Some(dir) = &config.output_dir {
        config::prepare_output_dir(dir).await?;
    }

    let client = ChatClient::new(&config.api_key, &config.model)?;
    let mut exit_code = 0;

    if config.token_usage {
        match probe_token_usage(&client).await {
            Some(usage) => println!("{}", serde_json::to_string_pretty(&usage)?),
            None => exit_code = 1,
        }
    }

    let mut echo = |chunk: &str| info!("{chunk}");
    let outcome = run_readcraft(&config, &client, tokio::io::stdout(), &mut echo).await?;

    Ok(exit_code.max(outcome.exit_code()))
}
