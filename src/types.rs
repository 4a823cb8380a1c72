use crate::error::Csv2SqlError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix that marks a field as a date to be replaced by the timestamp token
pub const DEFAULT_DATE_PREFIX: &str = "2024";

/// SQL token emitted in place of date-like fields
pub const TIMESTAMP_TOKEN: &str = "LOCALTIMESTAMP";

/// SQL literal emitted for null defaults
pub const NULL_LITERAL: &str = "NULL";

/// How rows whose field count differs from the configured column count are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCountPolicy {
    /// Zip positionally and ignore the mismatch
    #[default]
    Lenient,
    /// Reject the row with a field count error
    Strict,
}

/// A column absent from the source rows, appended to every statement with a fixed default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraColumn {
    /// Column name
    pub name: String,
    /// Declared type tag; only `string` changes how the default renders
    pub data_type: String,
    /// Raw default value; `None` or `null` in any case renders as NULL
    #[serde(default)]
    pub default: Option<String>,
}

impl ExtraColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, default: Option<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            data_type: data_type.into().trim().to_lowercase(),
            default: default.map(|value| value.trim().to_string()),
        }
    }

    pub fn is_string(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("string")
    }

    /// Render the default as it appears in the VALUES list
    pub fn rendered_default(&self) -> String {
        match self.default.as_deref().map(str::trim) {
            None => NULL_LITERAL.to_string(),
            Some(value) if value.eq_ignore_ascii_case("null") => NULL_LITERAL.to_string(),
            Some(value) if self.is_string() => format!("'{}'", value),
            Some(value) => value.to_string(),
        }
    }
}

fn default_date_prefix() -> String {
    DEFAULT_DATE_PREFIX.to_string()
}

/// Complete description of one conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Target table name, trimmed when rendered
    pub table_name: String,
    /// Column names for the statement header, in order
    pub column_names: Vec<String>,
    /// 1-based field positions whose values are single-quoted
    #[serde(default)]
    pub quote_columns: BTreeSet<usize>,
    /// 1-based field positions mapped to their modulus divisor
    #[serde(default)]
    pub mod_columns: BTreeMap<usize, i64>,
    /// Columns appended after the source fields
    #[serde(default)]
    pub extra_columns: Vec<ExtraColumn>,
    /// Handling of rows whose field count differs from `column_names`
    #[serde(default)]
    pub field_count_policy: FieldCountPolicy,
    /// Record failing rows and keep going instead of aborting the run
    #[serde(default)]
    pub continue_on_error: bool,
    /// Drop the first line of the source
    #[serde(default)]
    pub skip_header: bool,
    /// Drop lines that are empty after trimming
    #[serde(default)]
    pub skip_blank_lines: bool,
    /// Transform rows on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
    /// Fields starting with this prefix become the timestamp token; empty disables
    #[serde(default = "default_date_prefix")]
    pub date_prefix: String,
}

impl ConversionConfig {
    pub fn new(table_name: impl Into<String>, column_names: Vec<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_names,
            quote_columns: BTreeSet::new(),
            mod_columns: BTreeMap::new(),
            extra_columns: Vec::new(),
            field_count_policy: FieldCountPolicy::default(),
            continue_on_error: false,
            skip_header: false,
            skip_blank_lines: false,
            parallel: false,
            date_prefix: default_date_prefix(),
        }
    }

    pub fn with_quote_columns(mut self, columns: impl IntoIterator<Item = usize>) -> Self {
        self.quote_columns.extend(columns);
        self
    }

    pub fn with_mod_column(mut self, column: usize, divisor: i64) -> Self {
        self.mod_columns.insert(column, divisor);
        self
    }

    pub fn with_extra_column(mut self, column: ExtraColumn) -> Self {
        self.extra_columns.push(column);
        self
    }

    pub fn with_field_count_policy(mut self, policy: FieldCountPolicy) -> Self {
        self.field_count_policy = policy;
        self
    }

    /// Header columns: configured names followed by extra column names
    pub fn header_columns(&self) -> Vec<String> {
        self.column_names
            .iter()
            .cloned()
            .chain(self.extra_columns.iter().map(|column| column.name.clone()))
            .collect()
    }

    /// Check required fields and numeric settings before any row is processed
    pub fn validate(&self) -> Result<(), Csv2SqlError> {
        if self.table_name.trim().is_empty() {
            return Err(Csv2SqlError::config_parse("table_name", "table name is required"));
        }

        if self.column_names.is_empty() {
            return Err(Csv2SqlError::config_parse(
                "column_names",
                "at least one column name is required",
            ));
        }

        if let Some(position) = self.column_names.iter().position(|name| name.trim().is_empty()) {
            return Err(Csv2SqlError::config_parse(
                "column_names",
                format!("column name at position {} is empty", position + 1),
            ));
        }

        if self.quote_columns.contains(&0) {
            return Err(Csv2SqlError::config_parse(
                "quote_columns",
                "column positions are 1-based; 0 is not a valid position",
            ));
        }

        for (&column, &divisor) in &self.mod_columns {
            if column == 0 {
                return Err(Csv2SqlError::config_parse(
                    "mod_columns",
                    "column positions are 1-based; 0 is not a valid position",
                ));
            }
            if divisor <= 0 {
                return Err(Csv2SqlError::config_parse(
                    "mod_columns",
                    format!("divisor for column {} must be positive, got {}", column, divisor),
                ));
            }
        }

        if let Some(position) = self.extra_columns.iter().position(|column| column.name.is_empty()) {
            return Err(Csv2SqlError::config_parse(
                "extra_columns",
                format!("extra column at position {} has no name", position + 1),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_rendered_default_null_any_case() {
        for raw in ["null", "NULL", "Null"] {
            let column = ExtraColumn::new("status", "string", Some(raw.to_string()));
            assert_eq!(column.rendered_default(), "NULL");
        }
        let column = ExtraColumn::new("count", "int", None);
        assert_eq!(column.rendered_default(), "NULL");
    }

    #[test]
    fn test_rendered_default_quotes_only_strings() {
        let status = ExtraColumn::new("status", "String", Some(" active ".to_string()));
        assert_eq!(status.data_type, "string");
        assert_eq!(status.rendered_default(), "'active'");

        let count = ExtraColumn::new("count", "int", Some("0".to_string()));
        assert_eq!(count.rendered_default(), "0");
    }

    #[test]
    fn test_header_columns_appends_extra_names() {
        let config = ConversionConfig::new("t", columns(&["a", "b"]))
            .with_extra_column(ExtraColumn::new("status", "string", None));
        assert_eq!(config.header_columns(), columns(&["a", "b", "status"]));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let config = ConversionConfig::new("  ", columns(&["a"]));
        assert!(matches!(
            config.validate(),
            Err(Csv2SqlError::ConfigParse { ref field, .. }) if field == "table_name"
        ));

        let config = ConversionConfig::new("t", vec![]);
        assert!(config.validate().is_err());

        let config = ConversionConfig::new("t", columns(&["a", " "]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_positions_and_divisors() {
        let base = ConversionConfig::new("t", columns(&["a"]));
        assert!(base.clone().with_quote_columns([0]).validate().is_err());
        assert!(base.clone().with_mod_column(0, 3).validate().is_err());
        assert!(base.clone().with_mod_column(1, 0).validate().is_err());
        assert!(base.clone().with_mod_column(1, -4).validate().is_err());
        assert!(base.with_mod_column(1, 4).with_quote_columns([2]).validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "table_name": "users",
            "column_names": ["id", "name"],
            "quote_columns": [2],
            "mod_columns": {"1": 11},
            "extra_columns": [{"name": "status", "data_type": "string", "default": "active"}]
        }"#;
        let config: ConversionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mod_columns.get(&1), Some(&11));
        assert!(config.quote_columns.contains(&2));
        assert_eq!(config.date_prefix, DEFAULT_DATE_PREFIX);
        assert_eq!(config.field_count_policy, FieldCountPolicy::Lenient);
        assert!(!config.continue_on_error);
    }
}
