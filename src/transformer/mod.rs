// Row-to-statement transformation and batch conversion
pub mod converter;
pub mod row_transformer;
pub mod sql_generator;


pub use converter::{convert_file, convert_source, ConversionResult, ConversionStatistics, Converter, RowFailure};
pub use row_transformer::{apply_modulus, split_fields, trim_field, RowTransformer};
pub use sql_generator::{render_script, render_values, InsertStatement};
