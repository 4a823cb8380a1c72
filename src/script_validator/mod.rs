// Validation of generated SQL scripts
pub mod validator;

pub use validator::{ScriptValidationResult, ScriptValidator, StatementReport};
