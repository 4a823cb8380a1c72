use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use csv2sql::config::{load_config_file, write_config_file, ConfigOverrides};
use csv2sql::error::Csv2SqlError;
use csv2sql::monitoring::{monitoring_system, RunMetric, RunStatus};
use csv2sql::script_validator::ScriptValidator;
use csv2sql::transformer::{convert_file, convert_source, Converter};
use csv2sql::types::*;

/// Scratch directory holding a source file and an output path
struct TestFiles {
    _dir: TempDir,
    source: PathBuf,
    output: PathBuf,
}

impl TestFiles {
    async fn new(source_content: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("input.csv");
        let output = dir.path().join("output.sql");
        tokio::fs::write(&source, source_content).await?;
        Ok(Self {
            _dir: dir,
            source,
            output,
        })
    }

    async fn output(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.output).await?)
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Most recent completed run for a source path
fn last_run_for(source: &std::path::Path) -> Option<RunMetric> {
    let source = source.to_string_lossy();
    monitoring_system()
        .completed_runs()
        .into_iter()
        .filter(|run| run.source == source)
        .last()
}

#[tokio::test]
async fn test_convert_file_end_to_end() -> Result<()> {
    let files = TestFiles::new("7, hello\n2024-05-01, world\n10, again\n").await?;
    let config = ConversionConfig::new("t", columns(&["a", "b"]))
        .with_quote_columns([2])
        .with_mod_column(1, 3)
        .with_extra_column(ExtraColumn::new("status", "string", Some("active".to_string())));

    // The date row has a modulus column on a non-integer field
    let mut lenient = config.clone();
    lenient.continue_on_error = true;
    let result = convert_file(lenient, &files.source, &files.output).await?;

    assert_eq!(result.statistics.rows_converted, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].line_number, 2);
    assert_eq!(
        files.output().await?,
        "INSERT INTO t (a, b, status) VALUES (7, 'hello', 1, 'active');\n\
         INSERT INTO t (a, b, status) VALUES (10, 'again', 1, 'active');\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_output_is_overwritten() -> Result<()> {
    let files = TestFiles::new("1,2\n").await?;
    tokio::fs::write(&files.output, "old content that is longer than the new one\n").await?;

    convert_file(ConversionConfig::new("t", columns(&["a", "b"])), &files.source, &files.output).await?;

    assert_eq!(files.output().await?, "INSERT INTO t (a, b) VALUES (1, 2);\n");
    Ok(())
}

#[tokio::test]
async fn test_failed_run_leaves_destination_untouched() -> Result<()> {
    let files = TestFiles::new("1, a\nnot-a-number, b\n").await?;
    let config = ConversionConfig::new("t", columns(&["a", "b"])).with_mod_column(1, 2);

    let err = convert_file(config, &files.source, &files.output).await.unwrap_err();

    assert!(matches!(err, Csv2SqlError::NumericField { line: 2, column: 1, .. }));
    assert!(!files.output.exists());
    Ok(())
}

#[tokio::test]
async fn test_successful_run_is_recorded_as_completed() -> Result<()> {
    let files = TestFiles::new("1, a\n").await?;
    let config = ConversionConfig::new("t", columns(&["a", "b"]));

    convert_file(config, &files.source, &files.output).await?;

    let run = last_run_for(&files.source).expect("run should be recorded");
    assert_eq!(run.status, RunStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn test_unwritable_destination_is_recorded_as_failed() -> Result<()> {
    let files = TestFiles::new("1, a\n").await?;
    let destination = files.source.with_file_name("no_such_dir").join("out.sql");
    let config = ConversionConfig::new("t", columns(&["a", "b"]));

    let err = convert_file(config, &files.source, &destination).await.unwrap_err();

    assert!(matches!(err, Csv2SqlError::Io(_)));
    assert!(!destination.exists());
    let run = last_run_for(&files.source).expect("run should be recorded");
    assert!(matches!(run.status, RunStatus::Failed(_)));
    Ok(())
}

#[tokio::test]
async fn test_convert_source_does_not_write() -> Result<()> {
    let files = TestFiles::new("1, a\n2, b\n").await?;
    let converter = Converter::new(ConversionConfig::new("t", columns(&["a", "b"])))?;

    let result = convert_source(&converter, &files.source).await?;

    assert_eq!(result.statements.len(), 2);
    assert!(!files.output.exists());
    assert_eq!(last_run_for(&files.source).map(|run| run.status), Some(RunStatus::Completed));
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_fails_before_reading_source() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.csv");
    let output = dir.path().join("out.sql");

    let err = convert_file(ConversionConfig::new("t", vec![]), &missing, &output)
        .await
        .unwrap_err();

    assert!(matches!(err, Csv2SqlError::ConfigParse { .. }));
    Ok(())
}

#[tokio::test]
async fn test_missing_source_is_an_io_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = convert_file(
        ConversionConfig::new("t", columns(&["a"])),
        &dir.path().join("missing.csv"),
        &dir.path().join("out.sql"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Csv2SqlError::Io(_)));
    Ok(())
}

#[tokio::test]
async fn test_config_file_with_flag_overrides() -> Result<()> {
    let files = TestFiles::new("id,name\n1, Ada\n2, Grace\n").await?;
    let config_path = files.source.with_file_name("config.json");

    let base = ConversionConfig::new("people", columns(&["id", "name"])).with_quote_columns([2]);
    write_config_file(&config_path, &base).await?;

    let overrides = ConfigOverrides {
        skip_header: true,
        extra_columns: vec!["created_at:timestamp:null".to_string()],
        ..Default::default()
    };
    let config = overrides.apply(Some(load_config_file(&config_path).await?))?;
    convert_file(config, &files.source, &files.output).await?;

    assert_eq!(
        files.output().await?,
        "INSERT INTO people (id, name, created_at) VALUES (1, 'Ada', NULL);\n\
         INSERT INTO people (id, name, created_at) VALUES (2, 'Grace', NULL);\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_generated_script_passes_validation() -> Result<()> {
    let files = TestFiles::new("1, Ada, 2024-01-01\n2, Grace, 2024-02-02\n").await?;
    let config = ConversionConfig::new("people", columns(&["id", "name", "joined"])).with_quote_columns([2]);

    convert_file(config, &files.source, &files.output).await?;
    let result = ScriptValidator::new()
        .with_expected_table("people")
        .validate_file(&files.output)
        .await?;

    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.statements.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_modulus_script_reports_count_warning() -> Result<()> {
    let files = TestFiles::new("7, hello\n").await?;
    let config = ConversionConfig::new("t", columns(&["a", "b"]))
        .with_quote_columns([2])
        .with_mod_column(1, 3);

    convert_file(config, &files.source, &files.output).await?;
    let result = ScriptValidator::new().validate_file(&files.output).await?;

    assert!(result.is_valid);
    assert_eq!(result.warnings.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_parallel_file_conversion_preserves_order() -> Result<()> {
    let content: String = (1..=1000).map(|n| format!("{}, row{}\n", n, n)).collect();
    let files = TestFiles::new(&content).await?;

    let mut config = ConversionConfig::new("t", columns(&["a", "b"])).with_mod_column(1, 10);
    config.parallel = true;
    convert_file(config, &files.source, &files.output).await?;

    let output = files.output().await?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1000);
    assert_eq!(lines[0], "INSERT INTO t (a, b) VALUES (1, row1, 1);");
    assert_eq!(lines[999], "INSERT INTO t (a, b) VALUES (1000, row1000, 0);");
    Ok(())
}
