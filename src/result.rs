//! Per-file results and the run-level outcome.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether README generation for a file produced any text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

/// Outcome of processing one source file. Serialized as the `<stem>_README.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeResult {
    pub file: String,
    pub readme_content: Option<String>,
    pub status: Status,
}

impl ReadmeResult {
    /// Classifies generated text into a result. Empty text counts as no text.
    pub fn new(file: &Path, readme_content: Option<String>) -> Self {
        let readme_content = readme_content.filter(|text| !text.is_empty());
        let status = if readme_content.is_some() {
            Status::Success
        } else {
            Status::Failure
        };

        Self {
            file: file.display().to_string(),
            readme_content,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Results in processing order plus the AND of their statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    results: Vec<ReadmeResult>,
    all_success: bool,
}

impl Default for RunOutcome {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            all_success: true,
        }
    }
}

impl RunOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a result for `file`, appends it, and returns a reference to it.
    pub fn record(&mut self, file: &Path, readme_content: Option<String>) -> &ReadmeResult {
        let result = ReadmeResult::new(file, readme_content);
        self.all_success &= result.is_success();
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    pub fn results(&self) -> &[ReadmeResult] {
        &self.results
    }

    pub fn all_success(&self) -> bool {
        self.all_success
    }

    /// Process exit code: 0 when every recorded file succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.all_success { 0 } else { 1 }
    }
}

/// True when no result is a failure. An empty slice is vacuously successful.
pub fn overall_success(results: &[ReadmeResult]) -> bool {
    results.iter().all(ReadmeResult::is_success)
}
