use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use json_match_config::{Config, ConfigError, LoadOptions, MatchMode, ReportFormat};
use json_match_format::{render_document_diff, Renderer};
use json_match_ops::Matcher;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "JSON_MATCH_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Match = 0,
    Mismatch = 1,
    Authoring = 2,
    Io = 4,
}

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(rules) = &cli.rules {
        options = options.with_override_path(rules);
    }
    let mut config = match Config::load(options) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("json-match error: {err}");
            return Ok(config_exit_code(&err) as i32);
        }
    };
    for source in &config.sources.layers {
        debug!(source = %source.describe(), "loaded configuration layer");
    }

    if let Some(mode) = cli.mode {
        config.matching.mode = mode.into();
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }

    let expected = read_document(&cli.expected)?;
    let actual = read_document(&cli.actual)?;

    let matcher = match Matcher::from_config(&config) {
        Ok(matcher) => matcher,
        Err(err) => {
            eprintln!("json-match error: {err}");
            return Ok(ExitCode::Authoring as i32);
        }
    };

    let report = matcher.compare(&expected, &actual);
    emit(&Renderer::from_config(&config).render(&report))?;

    if cli.diff && !report.matched() {
        if let Some(diff) = render_document_diff(&expected, &actual) {
            emit(&diff)?;
        }
    }

    let code = if report.matched() {
        ExitCode::Match
    } else {
        ExitCode::Mismatch
    };
    Ok(code as i32)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded in another process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn config_exit_code(err: &ConfigError) -> ExitCode {
    match err {
        ConfigError::Parse { .. } | ConfigError::Validation(_) => ExitCode::Authoring,
        ConfigError::WorkingDirectory { .. }
        | ConfigError::OverrideNotFound { .. }
        | ConfigError::Io { .. } => ExitCode::Io,
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {} as JSON", path.display()))
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Compare a JSON document against an expected subset",
    long_about = None
)]
struct Cli {
    /// Document describing the required structure
    #[arg(value_name = "EXPECTED")]
    expected: PathBuf,
    /// Document under test
    #[arg(value_name = "ACTUAL")]
    actual: PathBuf,
    /// Comparison mode for scalar values
    #[arg(long, value_enum)]
    mode: Option<ModeValue>,
    /// Rules file used instead of discovered `.json-match.toml` files
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,
    /// Report output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Print a unified diff of both documents on mismatch
    #[arg(long)]
    diff: bool,
    /// Enable debug logging on stderr
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeValue {
    Exact,
    Type,
}

impl From<ModeValue> for MatchMode {
    fn from(value: ModeValue) -> Self {
        match value {
            ModeValue::Exact => MatchMode::Exact,
            ModeValue::Type => MatchMode::Type,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatValue {
    Plain,
    Json,
}

impl From<FormatValue> for ReportFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Plain => ReportFormat::Plain,
            FormatValue::Json => ReportFormat::Json,
        }
    }
}
