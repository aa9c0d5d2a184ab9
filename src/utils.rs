use std::ffi::OsStr;
use std::path::Path;

/// Human-readable description of a source file, used in the generation prompt.
pub fn describe_source(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "py" => "Python script",
        "js" | "mjs" | "cjs" => "JavaScript script",
        "jsx" => "React component",
        "ts" => "TypeScript module",
        "tsx" => "React TypeScript component",
        "rs" => "Rust source file",
        "go" => "Go source file",
        "java" => "Java class",
        "c" | "h" => "C source file",
        "cpp" | "cc" | "hpp" => "C++ source file",
        "rb" => "Ruby script",
        "sh" | "bash" => "shell script",
        "html" => "HTML page",
        "css" => "stylesheet",
        _ => "script",
    }
}

/// File stem used to derive `<stem>_README.md` and `<stem>_README.json`.
pub fn output_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
