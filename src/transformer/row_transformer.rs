use crate::error::Csv2SqlError;
use crate::transformer::sql_generator::InsertStatement;
use crate::types::{ConversionConfig, FieldCountPolicy, TIMESTAMP_TOKEN};
use tracing::debug;

/// Split a line on literal commas
///
/// No quoting or escaping is honored. A line without commas is a single field
/// (an empty line is one empty field); otherwise trailing empty fields are dropped.
pub fn split_fields(line: &str) -> Vec<&str> {
    if !line.contains(',') {
        return vec![line];
    }

    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }
    fields
}

/// Strip ASCII control characters and spaces from both ends
///
/// Other Unicode whitespace such as U+00A0 is kept, so a field like "\u{a0}7"
/// is not a valid integer.
pub fn trim_field(raw: &str) -> &str {
    raw.trim_matches(|c: char| c <= ' ')
}

/// Turns source lines into INSERT statements according to a conversion configuration
#[derive(Debug, Clone)]
pub struct RowTransformer {
    config: ConversionConfig,
    table_name: String,
    header: Vec<String>,
    extra_defaults: Vec<String>,
}

impl RowTransformer {
    /// Create a transformer; the configuration is expected to be validated already
    pub fn new(config: ConversionConfig) -> Self {
        let table_name = config.table_name.trim().to_string();
        let header = config.header_columns();
        let extra_defaults = config
            .extra_columns
            .iter()
            .map(|column| column.rendered_default())
            .collect();

        Self {
            config,
            table_name,
            header,
            extra_defaults,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Transform one source line into a statement
    pub fn transform_line(&self, line_number: usize, line: &str) -> Result<InsertStatement, Csv2SqlError> {
        let fields = split_fields(line);
        let expected = self.config.column_names.len();

        if fields.len() != expected {
            match self.config.field_count_policy {
                FieldCountPolicy::Strict => {
                    return Err(Csv2SqlError::FieldCount {
                        line: line_number,
                        expected,
                        found: fields.len(),
                    });
                }
                FieldCountPolicy::Lenient => {
                    debug!(line = line_number, expected, found = fields.len(), "Field count mismatch");
                }
            }
        }

        let mut field_values = Vec::with_capacity(fields.len());
        let mut trailing_values = Vec::with_capacity(self.config.mod_columns.len() + self.extra_defaults.len());

        for (index, raw) in fields.iter().enumerate() {
            let position = index + 1;
            let trimmed = trim_field(raw);

            field_values.push(self.render_field(position, trimmed));

            if let Some(&divisor) = self.config.mod_columns.get(&position) {
                let remainder = apply_modulus(line_number, position, trimmed, divisor)?;
                trailing_values.push(remainder.to_string());
            }
        }

        trailing_values.extend(self.extra_defaults.iter().cloned());

        Ok(InsertStatement {
            line_number,
            field_count: fields.len(),
            table_name: self.table_name.clone(),
            columns: self.header.clone(),
            field_values,
            trailing_values,
        })
    }

    /// Display value of a trimmed field: date substitution, then quoting
    fn render_field(&self, position: usize, trimmed: &str) -> String {
        let prefix = self.config.date_prefix.as_str();
        let value = if !prefix.is_empty() && trimmed.starts_with(prefix) {
            TIMESTAMP_TOKEN
        } else {
            trimmed
        };

        if self.config.quote_columns.contains(&position) {
            format!("'{}'", value)
        } else {
            value.to_string()
        }
    }
}

/// Remainder of the field's integer value; the sign follows the dividend
pub fn apply_modulus(line: usize, column: usize, trimmed: &str, divisor: i64) -> Result<i64, Csv2SqlError> {
    let value = trimmed.parse::<i64>().map_err(|source| Csv2SqlError::NumericField {
        line,
        column,
        value: trimmed.to_string(),
        source,
    })?;
    value.checked_rem(divisor).ok_or_else(|| {
        Csv2SqlError::config_parse(
            "mod_columns",
            format!("divisor for column {} must be positive, got {}", column, divisor),
        )
    })
}
