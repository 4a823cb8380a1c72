use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use csv2sql::config::{self, ConfigOverrides, PromptSession};
use csv2sql::monitoring;
use csv2sql::script_validator::ScriptValidator;
use csv2sql::transformer::{convert_file, convert_source, ConversionResult, Converter};
use csv2sql::types::{ConversionConfig, FieldCountPolicy};

#[derive(Parser)]
#[command(name = "csv2sql")]
#[command(about = "Convert comma-delimited text files into SQL INSERT scripts")]
#[command(version)]
#[command(long_about = "csv2sql turns every line of a comma-delimited file into one INSERT statement. Columns can be single-quoted, reduced modulo a divisor (the remainder is appended as an extra value), and fixed-value columns can be appended to every row. Fields starting with 2024 are replaced by LOCALTIMESTAMP.")]
#[command(after_help = "EXAMPLES:
    # Convert with flags
    csv2sql convert -s users.csv -o users.sql --table users --columns id,name --quote-columns 2 --mod-columns 1:11

    # Append a constant column
    csv2sql convert -s users.csv -o users.sql --table users --columns id,name --extra-column status:string:active

    # Use a JSON configuration file
    csv2sql init-config -o csv2sql.json
    csv2sql convert -s users.csv -o users.sql --config csv2sql.json

    # Answer the questions interactively
    csv2sql interactive

    # Check a generated script
    csv2sql validate -s users.sql --table users")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    Lenient,
    Strict,
}

impl From<Policy> for FieldCountPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Lenient => FieldCountPolicy::Lenient,
            Policy::Strict => FieldCountPolicy::Strict,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a delimited file into an INSERT script
    Convert {
        /// Path to the comma-delimited source file
        #[arg(short, long, value_name = "FILE")]
        source: PathBuf,

        /// Output SQL file (overwritten)
        #[arg(short, long, value_name = "FILE", required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Print the script to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// JSON configuration file; flags below override its values
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Target table name
        #[arg(short, long)]
        table: Option<String>,

        /// Column names (comma-separated)
        #[arg(long)]
        columns: Option<String>,

        /// 1-based column numbers to enclose in single quotes (comma-separated)
        #[arg(long, value_name = "LIST")]
        quote_columns: Option<String>,

        /// Modulus rules (comma-separated, format: column_number:divisor)
        #[arg(long, value_name = "LIST")]
        mod_columns: Option<String>,

        /// Appended column (format: name:type[:default]); repeatable
        #[arg(long = "extra-column", value_name = "SPEC")]
        extra_columns: Vec<String>,

        /// How to handle rows whose field count differs from the column count
        #[arg(long, value_enum)]
        field_count: Option<Policy>,

        /// Skip failing rows and report them instead of aborting
        #[arg(long)]
        continue_on_error: bool,

        /// Treat the first line as a header and skip it
        #[arg(long)]
        skip_header: bool,

        /// Skip lines that are blank
        #[arg(long)]
        skip_blank_lines: bool,

        /// Transform rows in parallel (output order is preserved)
        #[arg(long)]
        parallel: bool,

        /// Prefix that marks date fields to replace with LOCALTIMESTAMP (empty disables)
        #[arg(long, value_name = "PREFIX")]
        date_prefix: Option<String>,
    },

    /// Build the configuration by answering questions, then convert
    Interactive,

    /// Parse a generated script and report problems
    Validate {
        /// Path to the SQL script
        #[arg(short, long, value_name = "FILE")]
        script: PathBuf,

        /// Expected target table
        #[arg(short, long)]
        table: Option<String>,

        /// Output format for validation results
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a sample JSON configuration file
    InitConfig {
        /// Output path (default: csv2sql.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;
    monitoring::initialize_monitoring(monitoring::MonitoringConfig::default());

    info!("Starting csv2sql v{}", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command {
        Commands::Convert {
            source,
            output,
            stdout,
            config,
            table,
            columns,
            quote_columns,
            mod_columns,
            extra_columns,
            field_count,
            continue_on_error,
            skip_header,
            skip_blank_lines,
            parallel,
            date_prefix,
        } => {
            let overrides = ConfigOverrides {
                table_name: table,
                column_names: columns,
                quote_columns,
                mod_columns,
                extra_columns,
                field_count_policy: field_count.map(Into::into),
                continue_on_error,
                skip_header,
                skip_blank_lines,
                parallel,
                date_prefix,
            };
            execute_convert(&source, output.as_deref(), stdout, config.as_deref(), overrides).await
        }
        Commands::Interactive => execute_interactive().await,
        Commands::Validate { script, table, format } => execute_validate(&script, table, format).await,
        Commands::InitConfig { output } => {
            let output = output.unwrap_or_else(|| PathBuf::from("csv2sql.json"));
            config::write_config_file(&output, &config::sample_config())
                .await
                .with_context(|| format!("writing sample configuration to {:?}", output))?;
            println!("Sample configuration written to {}", output.display());
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn execute_convert(
    source: &Path,
    output: Option<&Path>,
    stdout: bool,
    config_file: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<()> {
    let base = match config_file {
        Some(path) => Some(
            config::load_config_file(path)
                .await
                .with_context(|| format!("loading configuration from {:?}", path))?,
        ),
        None => None,
    };
    let config = overrides.apply(base).context("validating configuration")?;
    info!(
        table = %config.table_name,
        columns = config.column_names.len(),
        quote_columns = config.quote_columns.len(),
        mod_columns = config.mod_columns.len(),
        extra_columns = config.extra_columns.len(),
        "Configuration ready"
    );

    match output {
        Some(destination) if !stdout => run_conversion(config, source, destination).await,
        _ => {
            let converter = Converter::new(config).context("validating configuration")?;
            let result = convert_source(&converter, source)
                .await
                .with_context(|| format!("converting {:?}", source))?;
            print!("{}", result.to_script());
            report_failures(&result);
            Ok(())
        }
    }
}

async fn execute_interactive() -> Result<()> {
    // Prompts are answered before any file is touched
    let answers = tokio::task::spawn_blocking(|| PromptSession::new(io::stdin().lock(), io::stdout()).run())
    .await
    .context("reading interactive answers")?
    .context("collecting configuration")?;

    run_conversion(answers.config, &answers.source, &answers.destination).await
}

async fn run_conversion(config: ConversionConfig, source: &Path, destination: &Path) -> Result<()> {
    info!("Converting {:?} into {:?}", source, destination);

    let result = convert_file(config, source, destination)
        .await
        .with_context(|| format!("converting {:?} into {:?}", source, destination))?;

    info!("Summary: {}", result.summary());
    report_failures(&result);
    println!("SQL script generated successfully!");
    Ok(())
}

fn report_failures(result: &ConversionResult) {
    for failure in &result.failures {
        warn!(line = failure.line_number, "Skipped row: {}", failure.message);
        eprintln!("  - line {}: {}", failure.line_number, failure.message);
    }
}

async fn execute_validate(script: &Path, table: Option<String>, format: OutputFormat) -> Result<()> {
    let mut validator = ScriptValidator::new();
    if let Some(table) = table {
        validator = validator.with_expected_table(table);
    }

    let result = validator
        .validate_file(script)
        .await
        .with_context(|| format!("reading script {:?}", script))?;

    match format {
        OutputFormat::Text => {
            for error in &result.errors {
                eprintln!("  ✗ {}", error);
            }
            for warning in &result.warnings {
                eprintln!("  ! {}", warning);
            }
            println!("{}", result.summary());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    if !result.is_valid {
        anyhow::bail!("script validation failed with {} errors", result.errors.len());
    }
    Ok(())
}

/// Initialize logging based on CLI configuration
fn initialize_logging(cli: &Cli) -> Result<()> {
    let log_level = if let Some(level) = &cli.log_level {
        level.clone().into()
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_ids(cli.verbose)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_ids(cli.verbose)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .init();
    }

    Ok(())
}
