// Interactive question-and-answer session that builds a conversion configuration
use crate::config::parser::{parse_column_names, parse_extra_column_types, parse_mod_columns, parse_quote_columns};
use crate::error::Csv2SqlError;
use crate::types::{ConversionConfig, ExtraColumn};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

/// Everything collected from an interactive session
#[derive(Debug, Clone)]
pub struct InteractiveAnswers {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub config: ConversionConfig,
}

/// Asks the conversion questions on `output` and reads answers from `input`
pub struct PromptSession<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSession<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Run the full question sequence and validate the resulting configuration
    pub fn run(mut self) -> Result<InteractiveAnswers, Csv2SqlError> {
        let source = PathBuf::from(self.ask("Enter the CSV file path: ")?.trim());
        let destination = PathBuf::from(self.ask("Enter the SQL output file path: ")?.trim());
        let table_name = self.ask("Enter the table name: ")?;
        let column_names = parse_column_names(&self.ask("Enter the column names (comma-separated): ")?)?;
        let quote_columns = parse_quote_columns(&self.ask(
            "Enter the column numbers to be enclosed in single quotes (comma-separated, 1-based index): ",
        )?)?;
        let mod_columns = parse_mod_columns(&self.ask(
            "Enter the column number for which to apply mod function (comma-separated, format: column_number:mod_value): ",
        )?)?;

        let mut config = ConversionConfig::new(table_name, column_names);
        config.quote_columns = quote_columns;
        config.mod_columns = mod_columns;

        let add_columns = self.ask("Do you want to add any new columns to the table? (yes/no): ")?;
        if add_columns.trim().eq_ignore_ascii_case("yes") {
            let column_types = parse_extra_column_types(&self.ask(
                "Enter new column names with data types (comma-separated, format: column_name:data_type): ",
            )?)?;
            for (name, data_type) in column_types {
                let default = self.ask(&format!(
                    "Enter the default value for column '{}' (or 'null' for NULL value): ",
                    name
                ))?;
                config.extra_columns.push(ExtraColumn::new(name, data_type, Some(default)));
            }
        }

        config.validate()?;
        debug!(table = %config.table_name, columns = config.column_names.len(), "Interactive configuration complete");

        Ok(InteractiveAnswers {
            source,
            destination,
            config,
        })
    }

    fn ask(&mut self, question: &str) -> Result<String, Csv2SqlError> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(Csv2SqlError::config_parse(
                "input",
                format!("input ended before answering: {}", question.trim()),
            ));
        }

        Ok(answer.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}
