// Configuration loading, text-form parsing and interactive prompting
pub mod parser;
pub mod prompt;

pub use parser::*;
pub use prompt::{InteractiveAnswers, PromptSession};

use crate::error::Csv2SqlError;
use crate::types::{ConversionConfig, ExtraColumn, FieldCountPolicy};
use std::path::Path;
use tracing::{debug, info};

/// Load a JSON configuration file; validation is left to the caller
pub async fn load_config_file(path: &Path) -> Result<ConversionConfig, Csv2SqlError> {
    debug!("Loading configuration from {:?}", path);
    let content = tokio::fs::read_to_string(path).await?;
    let config: ConversionConfig = serde_json::from_str(&content)?;
    info!(table = %config.table_name, "Loaded configuration from {:?}", path);
    Ok(config)
}

/// Write a configuration as pretty-printed JSON
pub async fn write_config_file(path: &Path, config: &ConversionConfig) -> Result<(), Csv2SqlError> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// A small but complete configuration used by `init-config`
pub fn sample_config() -> ConversionConfig {
    ConversionConfig::new(
        "users",
        vec!["id".to_string(), "name".to_string(), "created_at".to_string()],
    )
    .with_quote_columns([2])
    .with_mod_column(1, 11)
    .with_extra_column(ExtraColumn::new("status", "string", Some("active".to_string())))
    .with_extra_column(ExtraColumn::new("deleted_at", "timestamp", Some("null".to_string())))
}

/// Settings given in text form (flags), layered over an optional base configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub table_name: Option<String>,
    pub column_names: Option<String>,
    pub quote_columns: Option<String>,
    pub mod_columns: Option<String>,
    pub extra_columns: Vec<String>,
    pub field_count_policy: Option<FieldCountPolicy>,
    pub continue_on_error: bool,
    pub skip_header: bool,
    pub skip_blank_lines: bool,
    pub parallel: bool,
    pub date_prefix: Option<String>,
}

impl ConfigOverrides {
    /// Merge onto `base` and validate; without a base, table and columns are required
    pub fn apply(self, base: Option<ConversionConfig>) -> Result<ConversionConfig, Csv2SqlError> {
        let mut config = match base {
            Some(config) => config,
            None => {
                let table_name = self.table_name.clone().ok_or_else(|| {
                    Csv2SqlError::config_parse("table_name", "--table is required without --config")
                })?;
                let column_names = self.column_names.as_deref().ok_or_else(|| {
                    Csv2SqlError::config_parse("column_names", "--columns is required without --config")
                })?;
                ConversionConfig::new(table_name, parse_column_names(column_names)?)
            }
        };

        if let Some(table_name) = self.table_name {
            config.table_name = table_name;
        }
        if let Some(column_names) = self.column_names.as_deref() {
            config.column_names = parse_column_names(column_names)?;
        }
        if let Some(quote_columns) = self.quote_columns.as_deref() {
            config.quote_columns = parse_quote_columns(quote_columns)?;
        }
        if let Some(mod_columns) = self.mod_columns.as_deref() {
            config.mod_columns = parse_mod_columns(mod_columns)?;
        }
        if !self.extra_columns.is_empty() {
            config.extra_columns = self
                .extra_columns
                .iter()
                .map(|column| parse_extra_column(column))
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(policy) = self.field_count_policy {
            config.field_count_policy = policy;
        }
        if let Some(date_prefix) = self.date_prefix {
            config.date_prefix = date_prefix;
        }

        // Flags can only switch these on
        config.continue_on_error |= self.continue_on_error;
        config.skip_header |= self.skip_header;
        config.skip_blank_lines |= self.skip_blank_lines;
        config.parallel |= self.parallel;

        config.validate()?;
        Ok(config)
    }
}
