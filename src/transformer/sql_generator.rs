use serde::Serialize;
use std::fmt;

/// One INSERT statement produced from a single source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertStatement {
    /// 1-based line number in the source
    pub line_number: usize,
    /// Number of raw fields the line was split into
    pub field_count: usize,
    /// Trimmed table name
    pub table_name: String,
    /// Header columns: configured names then extra column names
    pub columns: Vec<String>,
    /// Display values of the raw fields, in field order
    pub field_values: Vec<String>,
    /// Modulus results followed by extra column defaults
    pub trailing_values: Vec<String>,
}

impl InsertStatement {
    /// Total number of rendered values
    pub fn value_count(&self) -> usize {
        self.field_values.len() + self.trailing_values.len()
    }

    /// Render the statement text, without a line terminator
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.table_name,
            self.columns.join(", "),
            render_values(&self.field_values, &self.trailing_values)
        )
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Field values joined by `, `, then each trailing value appended as `, <value>`
///
/// A row with no fields still gets the leading separator before trailing values.
pub fn render_values(field_values: &[String], trailing_values: &[String]) -> String {
    let mut values = field_values.join(", ");
    for value in trailing_values {
        values.push_str(", ");
        values.push_str(value);
    }
    values
}

/// Render statements as a script, one newline-terminated statement per line
pub fn render_script(statements: &[InsertStatement]) -> String {
    let mut script = String::new();
    for statement in statements {
        script.push_str(&statement.to_sql());
        script.push('\n');
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn statement(field_values: &[&str], trailing_values: &[&str]) -> InsertStatement {
        InsertStatement {
            line_number: 1,
            field_count: field_values.len(),
            table_name: "t".to_string(),
            columns: strings(&["a", "b"]),
            field_values: strings(field_values),
            trailing_values: strings(trailing_values),
        }
    }

    #[test]
    fn test_to_sql() {
        let statement = statement(&["7", "'hello'"], &["1"]);
        assert_eq!(statement.to_sql(), "INSERT INTO t (a, b) VALUES (7, 'hello', 1);");
        assert_eq!(statement.to_string(), statement.to_sql());
        assert_eq!(statement.value_count(), 3);
    }

    #[test]
    fn test_render_values_without_fields_keeps_separator() {
        assert_eq!(render_values(&[], &strings(&["'active'"])), ", 'active'");
        assert_eq!(render_values(&strings(&["1"]), &[]), "1");
    }

    #[test]
    fn test_render_script_terminates_every_line() {
        let script = render_script(&[statement(&["1", "2"], &[]), statement(&["3", "4"], &[])]);
        assert_eq!(
            script,
            "INSERT INTO t (a, b) VALUES (1, 2);\nINSERT INTO t (a, b) VALUES (3, 4);\n"
        );
        assert_eq!(render_script(&[]), "");
    }
}
