use crate::client::{ChatClient, Completion, Mode};
use crate::error::ChatError;
use crate::stream::ChunkSink;
use crate::utils::describe_source;
use log::info;
use std::path::Path;

/// Returned for empty input files instead of calling the API.
pub const NO_CONTENT_SENTINEL: &str = "No content to process";

pub fn build_prompt(path: &Path, contents: &str) -> String {
    format!(
        "Generate a README for this {}:\n\n{contents}\n\n\
         Please make the README fun and engaging! Add emojis to highlight sections and \
         use **bold text** for important terms or section titles like 'Function', 'Usage', \
         and 'Examples'. Avoid unnecessary sections like 'Authors' or 'Acknowledgments'.",
        describe_source(path)
    )
}

/// Generates README text for one file's contents.
pub async fn generate_readme(
    client: &ChatClient,
    path: &Path,
    contents: &str,
    mode: Mode,
    sink: &mut dyn ChunkSink,
) -> Result<String, ChatError> {
    if contents.is_empty() {
        return Ok(NO_CONTENT_SENTINEL.to_string());
    }

    let Completion { text, usage } = client
        .complete(&build_prompt(path, contents), mode, sink)
        .await?;

    if let Some(usage) = usage.filter(|usage| !usage.is_empty()) {
        info!("Token usage: {usage}");
    }

    Ok(text)
}
