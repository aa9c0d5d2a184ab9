use readcraft::{ReadmeResult, ReadmeWriter, Status};
use std::path::Path;
use tempfile::tempdir;
use tokio::fs;

#[tokio::test]
async fn writes_markdown_for_successful_result() -> anyhow::Result<()> {
    let out = tempdir()?;
    let result = ReadmeResult::new(Path::new("src/sample_file.py"), Some("Mocked README content".into()));

    let mut writer = ReadmeWriter::new(Some(out.path().to_path_buf()), false, Vec::new());
    writer.materialize(&result).await?;
    writer.finish(&[result]).await?;

    let readme = fs::read_to_string(out.path().join("sample_file_README.md")).await?;
    assert_eq!(readme, "Mocked README content");
    assert!(!out.path().join("sample_file_README.json").exists());
    assert!(writer.into_inner().is_empty());

    Ok(())
}

#[tokio::test]
async fn json_result_round_trips() -> anyhow::Result<()> {
    let out = tempdir()?;
    let result = ReadmeResult::new(Path::new("app.js"), Some("# App".into()));

    let mut writer = ReadmeWriter::new(Some(out.path().to_path_buf()), true, Vec::new());
    writer.materialize(&result).await?;

    let text = fs::read_to_string(out.path().join("app_README.json")).await?;
    assert!(text.contains("\n  \"file\": \"app.js\""), "two-space indent: {text}");

    let parsed: ReadmeResult = serde_json::from_str(&text)?;
    assert_eq!(parsed, result);

    Ok(())
}

#[tokio::test]
async fn failed_result_writes_json_but_no_markdown() -> anyhow::Result<()> {
    let out = tempdir()?;
    let result = ReadmeResult::new(Path::new("broken.py"), None);

    let mut writer = ReadmeWriter::new(Some(out.path().to_path_buf()), true, Vec::new());
    writer.materialize(&result).await?;

    assert!(!out.path().join("broken_README.md").exists());

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("broken_README.json")).await?)?;
    assert_eq!(
        value,
        serde_json::json!({"file": "broken.py", "readme_content": null, "status": "failure"})
    );

    Ok(())
}

#[tokio::test]
async fn prints_successful_text_once_without_output_dir() -> anyhow::Result<()> {
    let ok = ReadmeResult::new(Path::new("a.py"), Some("# A".into()));
    let failed = ReadmeResult::new(Path::new("b.py"), None);

    let mut writer = ReadmeWriter::new(None, false, Vec::new());
    writer.materialize(&ok).await?;
    writer.materialize(&failed).await?;
    writer.finish(&[ok, failed]).await?;

    assert_eq!(String::from_utf8(writer.into_inner())?, "# A\n");

    Ok(())
}

#[tokio::test]
async fn prints_text_then_aggregate_json_without_output_dir() -> anyhow::Result<()> {
    let results = vec![
        ReadmeResult::new(Path::new("a.py"), Some("# A".into())),
        ReadmeResult::new(Path::new("b.py"), None),
    ];

    let mut writer = ReadmeWriter::new(None, true, Vec::new());
    for result in &results {
        writer.materialize(result).await?;
    }
    writer.finish(&results).await?;

    let printed = String::from_utf8(writer.into_inner())?;
    let aggregate = printed
        .strip_prefix("# A\n")
        .expect("successful text is printed before the aggregate");

    let parsed: Vec<ReadmeResult> = serde_json::from_str(aggregate)?;
    assert_eq!(parsed, results);
    assert_eq!(parsed[1].status, Status::Failure);

    Ok(())
}

#[tokio::test]
async fn colliding_stems_overwrite_the_earlier_output() -> anyhow::Result<()> {
    let out = tempdir()?;
    let first = ReadmeResult::new(Path::new("main.py"), Some("python".into()));
    let second = ReadmeResult::new(Path::new("main.js"), Some("javascript".into()));

    let mut writer = ReadmeWriter::new(Some(out.path().to_path_buf()), true, Vec::new());
    writer.materialize(&first).await?;
    writer.materialize(&second).await?;

    assert_eq!(fs::read_to_string(out.path().join("main_README.md")).await?, "javascript");
    let json: ReadmeResult =
        serde_json::from_str(&fs::read_to_string(out.path().join("main_README.json")).await?)?;
    assert_eq!(json, second);

    Ok(())
}

#[tokio::test]
async fn missing_output_dir_is_an_error() {
    let out = tempdir().unwrap();
    let missing = out.path().join("does/not/exist");
    let result = ReadmeResult::new(Path::new("a.py"), Some("text".into()));

    let mut writer = ReadmeWriter::new(Some(missing), false, Vec::new());
    let err = writer.materialize(&result).await.unwrap_err();

    assert!(err.to_string().contains("Failed to write README"));
}
