// Checks generated INSERT scripts with a real SQL parser
use crate::error::Csv2SqlError;
use serde::Serialize;
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::path::Path;
use tracing::{debug, info};

/// Result of validating a script
#[derive(Debug, Clone, Serialize)]
pub struct ScriptValidationResult {
    pub is_valid: bool,
    pub statements: Vec<StatementReport>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScriptValidationResult {
    pub fn summary(&self) -> String {
        format!(
            "{} statements checked, {} errors, {} warnings",
            self.statements.len(),
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// What the parser found on one script line
#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    pub line_number: usize,
    pub parsed: bool,
    pub is_insert: bool,
    pub table_name: Option<String>,
    pub column_count: usize,
    pub value_count: usize,
}

/// Validates scripts of one-statement-per-line INSERTs
#[derive(Debug, Clone, Default)]
pub struct ScriptValidator {
    expected_table: Option<String>,
}

impl ScriptValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also flag statements that target a different table
    pub fn with_expected_table(mut self, table: impl Into<String>) -> Self {
        self.expected_table = Some(table.into().trim().to_string());
        self
    }

    pub async fn validate_file(&self, path: &Path) -> Result<ScriptValidationResult, Csv2SqlError> {
        info!("Validating SQL script {:?}", path);
        let script = tokio::fs::read_to_string(path).await?;
        Ok(self.validate_script(&script))
    }

    /// Parse every non-empty line; parse failures are errors, shape mismatches are warnings
    pub fn validate_script(&self, script: &str) -> ScriptValidationResult {
        let mut statements = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for (index, line) in script.lines().enumerate() {
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let report = match Parser::parse_sql(&PostgreSqlDialect {}, line) {
                Ok(parsed) => self.inspect(line_number, &parsed, &mut errors, &mut warnings),
                Err(e) => {
                    errors.push(format!("Line {}: {}", line_number, e));
                    StatementReport {
                        line_number,
                        parsed: false,
                        is_insert: false,
                        table_name: None,
                        column_count: 0,
                        value_count: 0,
                    }
                }
            };
            statements.push(report);
        }

        let is_valid = errors.is_empty();
        debug!(statements = statements.len(), errors = errors.len(), warnings = warnings.len(), "Script validated");

        ScriptValidationResult {
            is_valid,
            statements,
            errors,
            warnings,
        }
    }

    fn inspect(
        &self,
        line_number: usize,
        parsed: &[Statement],
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> StatementReport {
        let mut report = StatementReport {
            line_number,
            parsed: true,
            is_insert: false,
            table_name: None,
            column_count: 0,
            value_count: 0,
        };

        if parsed.len() != 1 {
            errors.push(format!("Line {}: expected one statement, found {}", line_number, parsed.len()));
            return report;
        }

        let Statement::Insert { table_name, columns, source, .. } = &parsed[0] else {
            errors.push(format!("Line {}: not an INSERT statement", line_number));
            return report;
        };

        report.is_insert = true;
        report.table_name = Some(table_name.to_string());
        report.column_count = columns.len();
        if let SetExpr::Values(values) = source.body.as_ref() {
            report.value_count = values.rows.iter().map(|row| row.len()).sum();
        }

        if let Some(expected) = &self.expected_table {
            if table_name.to_string() != *expected {
                errors.push(format!(
                    "Line {}: targets table {} instead of {}",
                    line_number, table_name, expected
                ));
            }
        }

        if report.column_count != report.value_count {
            warnings.push(format!(
                "Line {}: {} columns but {} values",
                line_number, report.column_count, report.value_count
            ));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_script() {
        let script = "INSERT INTO t (a, b) VALUES (7, 'hello');\n\
                      INSERT INTO t (a, b) VALUES (LOCALTIMESTAMP, 'x');\n";
        let result = ScriptValidator::new().with_expected_table("t").validate_script(script);

        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
        assert_eq!(result.statements.len(), 2);
        assert!(result.statements[0].is_insert);
        assert_eq!(result.statements[0].table_name.as_deref(), Some("t"));
        assert_eq!(result.statements[0].value_count, 2);
    }

    #[test]
    fn test_count_mismatch_is_a_warning() {
        let result = ScriptValidator::new().validate_script("INSERT INTO t (a, b) VALUES (7, 'hello', 1);\n");
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("2 columns but 3 values"));
    }

    #[test]
    fn test_unparseable_line_is_an_error() {
        let script = "INSERT INTO t (a, b) VALUES (1, 2);\nINSERT INTO t (a, b) VALUES ();\n";
        let result = ScriptValidator::new().validate_script(script);
        assert!(!result.is_valid);
        assert!(result.errors[0].starts_with("Line 2"));
        assert!(!result.statements[1].parsed);
    }

    #[test]
    fn test_non_insert_and_wrong_table() {
        let script = "SELECT 1;\nINSERT INTO other (a) VALUES (1);\n";
        let result = ScriptValidator::new().with_expected_table("t").validate_script(script);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("not an INSERT"));
        assert!(result.errors[1].contains("instead of t"));
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let result = ScriptValidator::new().validate_script("\n\nINSERT INTO t (a) VALUES (1);\n\n");
        assert_eq!(result.statements.len(), 1);
        assert_eq!(result.statements[0].line_number, 3);
    }
}
