use crate::error::Csv2SqlError;
use crate::monitoring::{self, RunTracker};
use crate::transformer::row_transformer::RowTransformer;
use crate::transformer::sql_generator::{render_script, InsertStatement};
use crate::types::ConversionConfig;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Result of converting a batch of lines
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Statements in input order
    pub statements: Vec<InsertStatement>,
    /// Rows that failed and were skipped (only with `continue_on_error`)
    pub failures: Vec<RowFailure>,
    /// Statistics about the conversion
    pub statistics: ConversionStatistics,
}

impl ConversionResult {
    /// Render the newline-terminated script
    pub fn to_script(&self) -> String {
        render_script(&self.statements)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} statements from {} lines ({} failed, {} skipped, {} with field count mismatch) in {}ms",
            self.statistics.rows_converted,
            self.statistics.lines_read,
            self.statistics.rows_failed,
            self.statistics.rows_skipped,
            self.statistics.mismatched_rows,
            self.statistics.processing_time_ms
        )
    }
}

/// A row that could not be converted
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based line number in the source
    pub line_number: usize,
    /// Error description including column context
    pub message: String,
}

/// Statistics about the conversion process
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStatistics {
    /// Lines in the source, including skipped ones
    pub lines_read: usize,
    /// Statements produced
    pub rows_converted: usize,
    /// Rows recorded as failures
    pub rows_failed: usize,
    /// Header and blank lines that were dropped
    pub rows_skipped: usize,
    /// Converted rows whose field count differs from the column count
    pub mismatched_rows: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Applies a row transformer to whole inputs
#[derive(Debug, Clone)]
pub struct Converter {
    transformer: RowTransformer,
}

impl Converter {
    /// Validate the configuration and build a converter for it
    pub fn new(config: ConversionConfig) -> Result<Self, Csv2SqlError> {
        config.validate()?;
        Ok(Self {
            transformer: RowTransformer::new(config),
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        self.transformer.config()
    }

    /// Convert the text of a whole source file
    pub fn convert_text(&self, text: &str) -> Result<ConversionResult, Csv2SqlError> {
        let lines: Vec<&str> = text.lines().collect();
        self.convert_lines(&lines)
    }

    /// Convert lines in order; the first failing row aborts unless `continue_on_error` is set
    pub fn convert_lines<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Result<ConversionResult, Csv2SqlError> {
        let start_time = std::time::Instant::now();
        let config = self.config();
        let mut statistics = ConversionStatistics {
            lines_read: lines.len(),
            ..Default::default()
        };

        let rows: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line.as_ref()))
            .filter(|(line_number, line)| {
                (!config.skip_header || *line_number != 1)
                    && (!config.skip_blank_lines || !line.trim().is_empty())
            })
            .collect();
        statistics.rows_skipped = lines.len() - rows.len();

        debug!(rows = rows.len(), parallel = config.parallel, "Converting rows");

        let mut statements = Vec::with_capacity(rows.len());
        let mut failures = Vec::new();

        if config.parallel {
            // Collecting an indexed parallel iterator keeps input order
            let outcomes: Vec<(usize, Result<InsertStatement, Csv2SqlError>)> = rows
                .par_iter()
                .map(|&(line_number, line)| (line_number, self.transformer.transform_line(line_number, line)))
                .collect();
            for (line_number, outcome) in outcomes {
                self.record(line_number, outcome, &mut statements, &mut failures)?;
            }
        } else {
            for &(line_number, line) in &rows {
                let outcome = self.transformer.transform_line(line_number, line);
                self.record(line_number, outcome, &mut statements, &mut failures)?;
            }
        }

        let expected = config.column_names.len();
        statistics.mismatched_rows = statements.iter().filter(|s| s.field_count != expected).count();
        statistics.rows_converted = statements.len();
        statistics.rows_failed = failures.len();
        statistics.processing_time_ms = start_time.elapsed().as_millis() as u64;

        if statistics.mismatched_rows > 0 {
            warn!(
                rows = statistics.mismatched_rows,
                expected, "Rows with a field count different from the configured column count"
            );
        }

        Ok(ConversionResult {
            statements,
            failures,
            statistics,
        })
    }

    fn record(
        &self,
        line_number: usize,
        outcome: Result<InsertStatement, Csv2SqlError>,
        statements: &mut Vec<InsertStatement>,
        failures: &mut Vec<RowFailure>,
    ) -> Result<(), Csv2SqlError> {
        match outcome {
            Ok(statement) => statements.push(statement),
            Err(e) if self.config().continue_on_error => {
                warn!(line = line_number, error = %e, "Skipping row");
                failures.push(RowFailure {
                    line_number,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                error!(line = line_number, error = %e, "Row conversion failed");
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Read `source`, convert it and overwrite `destination` with the script
///
/// The destination is written only after every row has been converted. The run
/// is recorded as completed only once the write succeeds.
pub async fn convert_file(
    config: ConversionConfig,
    source: &Path,
    destination: &Path,
) -> Result<ConversionResult, Csv2SqlError> {
    let converter = Converter::new(config)?;
    let tracker = monitoring::monitoring_system().start_run(&source.to_string_lossy());

    let outcome = async {
        let result = read_and_convert(&converter, source).await?;
        tokio::fs::write(destination, result.to_script()).await?;
        info!("Wrote {} statements to {:?}", result.statistics.rows_converted, destination);
        Ok::<_, Csv2SqlError>(result)
    }
    .await;

    finish_run(&tracker, &outcome);
    outcome
}

/// Read and convert `source` without writing anything
pub async fn convert_source(converter: &Converter, source: &Path) -> Result<ConversionResult, Csv2SqlError> {
    let tracker = monitoring::monitoring_system().start_run(&source.to_string_lossy());
    let outcome = read_and_convert(converter, source).await;
    finish_run(&tracker, &outcome);
    outcome
}

async fn read_and_convert(converter: &Converter, source: &Path) -> Result<ConversionResult, Csv2SqlError> {
    info!("Reading source file {:?}", source);
    let text = tokio::fs::read_to_string(source).await?;
    converter.convert_text(&text)
}

fn finish_run(tracker: &RunTracker, outcome: &Result<ConversionResult, Csv2SqlError>) {
    match outcome {
        Ok(result) => tracker.complete_success(
            result.statistics.rows_converted as u64,
            result.statistics.rows_failed as u64,
        ),
        Err(e) => tracker.complete_failure(&e.to_string()),
    }
}
