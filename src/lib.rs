pub mod error;
pub mod types;
pub mod config;
pub mod transformer;
pub mod script_validator;
pub mod monitoring;
