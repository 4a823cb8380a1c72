// Parsers for the comma-separated text forms of the conversion settings
use crate::error::Csv2SqlError;
use crate::types::ExtraColumn;
use std::collections::{BTreeMap, BTreeSet};

/// Parse `a, b, c` into trimmed column names; blank input yields no columns
pub fn parse_column_names(input: &str) -> Result<Vec<String>, Csv2SqlError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .enumerate()
        .map(|(index, name)| {
            let name = name.trim();
            if name.is_empty() {
                Err(Csv2SqlError::config_parse(
                    "column_names",
                    format!("column name at position {} is empty", index + 1),
                ))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

/// Parse `1, 3` into a set of 1-based positions
pub fn parse_quote_columns(input: &str) -> Result<BTreeSet<usize>, Csv2SqlError> {
    let mut columns = BTreeSet::new();
    if input.trim().is_empty() {
        return Ok(columns);
    }

    for token in input.split(',') {
        columns.insert(parse_position("quote_columns", token)?);
    }

    Ok(columns)
}

/// Parse `3:11, 5:7` into a position to divisor map
///
/// A repeated position keeps the last divisor. Parts after the divisor are ignored.
pub fn parse_mod_columns(input: &str) -> Result<BTreeMap<usize, i64>, Csv2SqlError> {
    let mut columns = BTreeMap::new();
    if input.trim().is_empty() {
        return Ok(columns);
    }

    for entry in input.split(',') {
        let mut parts = entry.split(':');
        let column = parts.next().unwrap_or_default();
        let divisor = parts.next().ok_or_else(|| {
            Csv2SqlError::config_parse(
                "mod_columns",
                format!("entry '{}' is missing the ':' separator (expected column:divisor)", entry.trim()),
            )
        })?;

        let column = parse_position("mod_columns", column)?;
        let divisor = divisor.trim().parse::<i64>().map_err(|e| {
            Csv2SqlError::config_parse(
                "mod_columns",
                format!("divisor '{}' for column {} is not an integer: {}", divisor.trim(), column, e),
            )
        })?;
        if divisor <= 0 {
            return Err(Csv2SqlError::config_parse(
                "mod_columns",
                format!("divisor for column {} must be positive, got {}", column, divisor),
            ));
        }

        columns.insert(column, divisor);
    }

    Ok(columns)
}

/// Parse `name:type, name:type` into (name, lowercased type) pairs; parts after the type are ignored
pub fn parse_extra_column_types(input: &str) -> Result<Vec<(String, String)>, Csv2SqlError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .map(|entry| {
            let mut parts = entry.split(':');
            let name = parts.next().unwrap_or_default();
            let data_type = parts.next().ok_or_else(|| {
                Csv2SqlError::config_parse(
                    "extra_columns",
                    format!("entry '{}' is missing the ':' separator (expected name:type)", entry.trim()),
                )
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Csv2SqlError::config_parse(
                    "extra_columns",
                    format!("entry '{}' has no column name", entry.trim()),
                ));
            }
            Ok((name.to_string(), data_type.trim().to_lowercase()))
        })
        .collect()
}

/// Parse a single `name:type[:default]` column; the default may itself contain ':'
pub fn parse_extra_column(input: &str) -> Result<ExtraColumn, Csv2SqlError> {
    let mut parts = input.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    let data_type = parts.next().ok_or_else(|| {
        Csv2SqlError::config_parse(
            "extra_columns",
            format!("'{}' is missing the ':' separator (expected name:type[:default])", input.trim()),
        )
    })?;
    if name.is_empty() {
        return Err(Csv2SqlError::config_parse(
            "extra_columns",
            format!("'{}' has no column name", input.trim()),
        ));
    }

    let default = parts.next().map(str::to_string);
    Ok(ExtraColumn::new(name, data_type, default))
}

fn parse_position(field: &str, token: &str) -> Result<usize, Csv2SqlError> {
    let token = token.trim();
    let position = token.parse::<usize>().map_err(|e| {
        Csv2SqlError::config_parse(field, format!("'{}' is not a valid column position: {}", token, e))
    })?;
    if position == 0 {
        return Err(Csv2SqlError::config_parse(
            field,
            "column positions are 1-based; 0 is not a valid position",
        ));
    }
    Ok(position)
}
