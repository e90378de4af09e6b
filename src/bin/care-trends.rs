//! care-trends CLI - command-line front end for the analytics engine
//!
//! Commands:
//! - report: Build a health trend report for one resident
//! - risk: Assess seizure risk from a resident's history
//! - validate: Check care-log records against the input schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use care_trends::config::AnalysisConfig;
use care_trends::history::ResidentHistoryCache;
use care_trends::schema::{RawLogRecord, RecordAdapter, ValidatedBatch};
use care_trends::types::Period;
use care_trends::{AnalysisError, HealthTrendAnalyzer, ENGINE_VERSION};

/// care-trends - trend, anomaly and seizure-risk analytics for daily care logs
#[derive(Parser)]
#[command(name = "care-trends")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Analyze daily care-observation records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "ndjson")]
    input_format: InputFormat,
}

#[derive(clap::Args)]
struct AnalysisArgs {
    /// Resident identifier
    #[arg(short, long)]
    resident_id: String,

    /// Reference time (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<String>,

    /// Analysis configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sort records by date instead of rejecting unsorted input
    #[arg(long)]
    sort: bool,

    /// Pretty-print output (default when writing to a terminal)
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a health trend report
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Reporting period
        #[arg(short, long, default_value = "weekly")]
        period: Period,
    },

    /// Assess seizure risk
    Risk {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Resident history file; loaded before and saved after the assessment
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Validate records against the input schema
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CareCliError> {
    match cli.command {
        Commands::Report {
            input,
            analysis,
            period,
        } => cmd_report(&input, &analysis, period),

        Commands::Risk {
            input,
            analysis,
            history,
        } => cmd_risk(&input, &analysis, history.as_deref()),

        Commands::Validate { input, json } => cmd_validate(&input, json),
    }
}

fn cmd_report(input: &InputArgs, analysis: &AnalysisArgs, period: Period) -> Result<(), CareCliError> {
    let batch = load_batch(input, analysis.sort)?;
    let analyzer = HealthTrendAnalyzer::with_config(load_config(analysis.config.as_deref())?)?;
    let now = parse_now(analysis.now.as_deref())?;

    let report = analyzer.generate_report(&analysis.resident_id, &batch.records, period, now)?;
    print_json(&report, analysis.pretty)
}

fn cmd_risk(input: &InputArgs, analysis: &AnalysisArgs, history: Option<&Path>) -> Result<(), CareCliError> {
    let batch = load_batch(input, analysis.sort)?;
    let config = load_config(analysis.config.as_deref())?;
    let now = parse_now(analysis.now.as_deref())?;

    let cache = match history {
        Some(path) if path.exists() => ResidentHistoryCache::from_json(&fs::read_to_string(path)?)?,
        _ => ResidentHistoryCache::new(config.history_retention_days),
    };
    let cache = Arc::new(cache);
    let analyzer = HealthTrendAnalyzer::with_config(config)?.with_history_cache(Arc::clone(&cache))?;

    let assessment = analyzer.predict_seizure_risk(&analysis.resident_id, &batch.records, now)?;

    if let Some(path) = history {
        fs::write(path, cache.to_json()?)?;
        info!(path = %path.display(), residents = cache.resident_count(), "saved resident history");
    }

    print_json(&assessment, analysis.pretty)
}

fn cmd_validate(input: &InputArgs, json: bool) -> Result<(), CareCliError> {
    let raw = read_raw(input)?;
    let issues = RecordAdapter::validate_records(&raw);

    let report = ValidationReport {
        total_records: raw.len(),
        valid_records: raw.len() - issues.len(),
        invalid_records: issues.len(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                index: issue.index,
                date: issue.date.clone(),
                error: issue.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} (index {}): {}",
                    err.date.as_deref().unwrap_or("undated"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(CareCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn read_input(path: &Path) -> Result<String, CareCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_raw(input: &InputArgs) -> Result<Vec<RawLogRecord>, CareCliError> {
    let data = read_input(&input.input)?;
    let raw = match input.input_format {
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&data)?,
        InputFormat::Json => RecordAdapter::parse_array(&data)?,
    };
    Ok(raw)
}

fn load_batch(input: &InputArgs, sort: bool) -> Result<ValidatedBatch, CareCliError> {
    let raw = read_raw(input)?;
    if raw.is_empty() {
        return Err(CareCliError::NoRecords);
    }

    let mut batch = RecordAdapter::to_records(&raw);
    if !batch.issues.is_empty() {
        warn!(skipped = batch.issues.len(), kept = batch.records.len(), "some records failed validation");
    }
    if sort {
        batch.sort_by_date();
    }
    Ok(batch)
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, CareCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn parse_now(value: Option<&str>) -> Result<DateTime<Utc>, CareCliError> {
    match value {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CareCliError::InvalidTime(format!("{text}: {e}"))),
        None => Ok(Utc::now()),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CareCliError> {
    let output = if pretty || atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

// ============================================================================
// Reports and errors
// ============================================================================

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    date: Option<String>,
    error: String,
}

#[derive(Debug)]
enum CareCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    InvalidTime(String),
}

impl From<io::Error> for CareCliError {
    fn from(e: io::Error) -> Self {
        CareCliError::Io(e)
    }
}

impl From<AnalysisError> for CareCliError {
    fn from(e: AnalysisError) -> Self {
        CareCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for CareCliError {
    fn from(e: serde_json::Error) -> Self {
        CareCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CareCliError> for CliError {
    fn from(e: CareCliError) -> Self {
        match e {
            CareCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CareCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::UnsortedRecords { .. } => "Sort records by date or pass --sort",
                    AnalysisError::InvalidConfig(_) => "Check the --config file against the defaults",
                    AnalysisError::ParseError(_) | AnalysisError::JsonError(_) => {
                        "Ensure input is a JSON array or NDJSON of care-log records"
                    }
                    _ => "Run 'care-trends validate' for details",
                };
                CliError {
                    code: "ANALYSIS_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CareCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CareCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CareCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            CareCliError::InvalidTime(msg) => CliError {
                code: "INVALID_TIME".to_string(),
                message: msg,
                hint: Some("Use RFC 3339, e.g. 2024-05-01T09:00:00Z".to_string()),
            },
        }
    }
}
