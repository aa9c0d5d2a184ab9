use ignore::WalkBuilder;
use log::{error, warn};
use std::path::{Path, PathBuf};

/// Resolves path arguments into the regular files to process, in argument order.
///
/// Files are taken as given. Directories contribute their files (sorted by
/// name), either their direct children or, with `recursive`, everything below
/// them. Hidden entries are skipped; ignore files (`.gitignore` and friends)
/// are not consulted. Missing paths are logged and skipped.
pub fn collect_files(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_dir(path, recursive));
        } else {
            error!("{} does not exist.", path.display());
        }
    }

    files
}

fn walk_dir(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(dir);

    builder
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .parents(false)
        .max_depth(if recursive { None } else { Some(1) })
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut entries = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                if entry.file_type().is_some_and(|ft| ft.is_file()) {
                    entries.push(entry.into_path());
                }
            }
            Err(err) => {
                warn!("Error walking path: {err}");
            }
        }
    }

    entries
}
