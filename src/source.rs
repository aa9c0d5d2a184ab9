use anyhow::{Context, Result};
use content_inspector::{ContentType, inspect};
use log::debug;
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;

/// Contents of an input file.
#[derive(Debug, PartialEq, Eq)]
pub enum Source {
    Text(String),
    Binary,
}

/// Reads a source file, detecting binary content from its first 8 KiB.
pub fn read_source(path: &Path) -> Result<Source> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file: {}", path.display()))?
        .len();
    if len == 0 {
        debug!("{} is empty", path.display());
        return Ok(Source::Text(String::new()));
    }

    let mmap = unsafe {
        MmapOptions::new()
            .map(&file)
            .with_context(|| format!("Failed to mmap file: {}", path.display()))?
    };

    let sample_size = std::cmp::min(8192, mmap.len());
    if inspect(&mmap[..sample_size]) == ContentType::BINARY {
        return Ok(Source::Binary);
    }

    let text = std::str::from_utf8(&mmap)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    debug!("Read {} bytes from {}", text.len(), path.display());

    Ok(Source::Text(text.to_owned()))
}
