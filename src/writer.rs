use crate::result::ReadmeResult;
use crate::utils::output_stem;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Persists results to `<stem>_README.md` / `<stem>_README.json` in an output
/// directory, or prints them to `stdout` when no directory is configured.
pub struct ReadmeWriter<W: AsyncWrite + Unpin> {
    output_dir: Option<PathBuf>,
    emit_json: bool,
    stdout: BufWriter<W>,
    written: HashSet<PathBuf>,
}

impl<W: AsyncWrite + Unpin> ReadmeWriter<W> {
    pub fn new(output_dir: Option<PathBuf>, emit_json: bool, stdout: W) -> Self {
        Self {
            output_dir,
            emit_json,
            stdout: BufWriter::new(stdout),
            written: HashSet::new(),
        }
    }

    pub fn markdown_path(dir: &Path, result: &ReadmeResult) -> PathBuf {
        dir.join(format!("{}_README.md", output_stem(Path::new(&result.file))))
    }

    pub fn json_path(dir: &Path, result: &ReadmeResult) -> PathBuf {
        dir.join(format!("{}_README.json", output_stem(Path::new(&result.file))))
    }

    /// Writes a single result.
    ///
    /// Markdown is only written for successful results. The JSON file is
    /// written for every result when JSON output is on. Without an output
    /// directory, successful text goes to stdout.
    pub async fn materialize(&mut self, result: &ReadmeResult) -> Result<()> {
        let Some(dir) = self.output_dir.clone() else {
            if let Some(content) = &result.readme_content {
                self.print(content).await?;
            }
            return Ok(());
        };

        if let Some(content) = &result.readme_content {
            let path = Self::markdown_path(&dir, result);
            self.claim(&path, result);
            fs::write(&path, content)
                .await
                .with_context(|| format!("Failed to write README to {}", path.display()))?;
            info!("README generated and saved as {}", path.display());
        }

        if self.emit_json {
            let path = Self::json_path(&dir, result);
            self.claim(&path, result);
            let json = serde_json::to_string_pretty(result)?;
            fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write JSON output to {}", path.display()))?;
            info!("JSON output saved as {}", path.display());
        }

        Ok(())
    }

    /// Outputs are keyed by file stem only, so `main.py` and `main.js` collide.
    fn claim(&mut self, path: &Path, result: &ReadmeResult) {
        if !self.written.insert(path.to_path_buf()) {
            warn!(
                "{} was already written this run; overwriting it with output for {}",
                path.display(),
                result.file
            );
        }
    }

    /// Prints the aggregate JSON document after the per-file text when there is no output directory.
    pub async fn finish(&mut self, results: &[ReadmeResult]) -> Result<()> {
        if self.emit_json && self.output_dir.is_none() {
            let json = serde_json::to_string_pretty(results)?;
            debug!("Printing {} results as JSON", results.len());
            self.print(&json).await?;
        }
        self.flush().await
    }

    async fn print(&mut self, text: &str) -> Result<()> {
        self.stdout
            .write_all(text.as_bytes())
            .await
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            self.stdout.write_all(b"\n").await?;
        }
        self.flush().await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.stdout.flush().await.context("Failed to flush output")
    }

    pub fn into_inner(self) -> W {
        self.stdout.into_inner()
    }
}
