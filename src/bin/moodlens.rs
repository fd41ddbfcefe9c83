//! moodlens CLI - Command-line interface for the mood insight engine
//!
//! Commands:
//! - report: Run every derivation over a record file
//! - export: Write the snapshot as CSV
//! - calendar: Print trailing calendar months
//! - validate: Validate record schema

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use moodlens::day::CalendarMonth;
use moodlens::export::{export_filename, write_csv};
use moodlens::schema::{RawMoodRecord, RecordAdapter, SCHEMA_VERSION};
use moodlens::store::{load_wellness, InMemoryStore, InMemoryWellnessFeed, SnapshotProvider};
use moodlens::types::{DailyScore, EntryId, UserId};
use moodlens::{EngineConfig, EngineError, MoodEngine, MoodReport, Snapshot};
use moodlens::{ENGINE_VERSION, PRODUCER_NAME};

/// moodlens - Mood insight engine for self-reported mood logs
#[derive(Parser)]
#[command(name = "moodlens")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Derive mood insights from logged records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every derivation and print a report
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,

        /// User whose records are analysed
        #[arg(long)]
        user_id: UserId,

        /// Day treated as today (YYYY-MM-DD, defaults to the local date)
        #[arg(long)]
        today: Option<String>,

        /// JSON array of daily wellness scores ({"date", "score"})
        #[arg(long)]
        scores: Option<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export records as CSV
    Export {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout, defaults to mood-logs-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// User whose records are exported
        #[arg(long)]
        user_id: UserId,

        /// Export date used for the default file name (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Print calendar months ending at today
    Calendar {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// User whose records are shown
        #[arg(long)]
        user_id: UserId,

        /// Day treated as today (YYYY-MM-DD, defaults to the local date)
        #[arg(long)]
        today: Option<String>,

        /// Number of months to print
        #[arg(long, default_value = "3")]
        months: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate records against mood.log_record.v1
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summary
    Text,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlens=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MoodCliError> {
    match cli.command {
        Commands::Report {
            input,
            input_format,
            output_format,
            user_id,
            today,
            scores,
            config,
        } => cmd_report(
            &input,
            input_format,
            output_format,
            user_id,
            today.as_deref(),
            scores.as_deref(),
            config.as_deref(),
        ),

        Commands::Export {
            input,
            output,
            input_format,
            user_id,
            today,
        } => cmd_export(&input, output.as_deref(), input_format, user_id, today.as_deref()),

        Commands::Calendar {
            input,
            input_format,
            user_id,
            today,
            months,
            json,
        } => cmd_calendar(&input, input_format, user_id, today.as_deref(), months, json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

fn cmd_report(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    user_id: UserId,
    today: Option<&str>,
    scores: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), MoodCliError> {
    let config = match config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let today = resolve_today(today)?;
    let snapshot = load_snapshot(input, input_format, user_id)?;

    let feed = match scores {
        Some(path) => {
            let scores: Vec<DailyScore> = serde_json::from_str(&fs::read_to_string(path)?)?;
            Some(InMemoryWellnessFeed::new(user_id, scores))
        }
        None => None,
    };
    let wellness = load_wellness(
        feed.as_ref().map(|f| f as &dyn moodlens::WellnessFeed),
        user_id,
        config.insights.wellness_score_threshold,
    );

    let engine = MoodEngine::new(config)?;
    let report = engine.report(&snapshot, today, wellness.as_deref());

    let output = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => format_report(&report),
    };
    println!("{}", output);
    Ok(())
}

fn cmd_export(
    input: &Path,
    output: Option<&Path>,
    input_format: InputFormat,
    user_id: UserId,
    today: Option<&str>,
) -> Result<(), MoodCliError> {
    let snapshot = load_snapshot(input, input_format, user_id)?;

    match output {
        Some(path) if path.to_string_lossy() == "-" => {
            let stdout = io::stdout();
            write_csv(snapshot.entries(), stdout.lock())?;
        }
        Some(path) => write_csv(snapshot.entries(), fs::File::create(path)?)?,
        None => {
            let path = PathBuf::from(export_filename(resolve_today(today)?));
            write_csv(snapshot.entries(), fs::File::create(&path)?)?;
            eprintln!("Wrote {} entries to {}", snapshot.len(), path.display());
        }
    }
    Ok(())
}

fn cmd_calendar(
    input: &Path,
    input_format: InputFormat,
    user_id: UserId,
    today: Option<&str>,
    months: u32,
    json: bool,
) -> Result<(), MoodCliError> {
    let today = resolve_today(today)?;
    let snapshot = load_snapshot(input, input_format, user_id)?;
    let calendar = MoodEngine::default().calendar(&snapshot, today, months);

    if json {
        println!("{}", serde_json::to_string_pretty(&calendar)?);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for month in &calendar {
        writeln!(out, "{}", format_month(month))?;
    }
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), MoodCliError> {
    let records = read_records(input, input_format)?;
    let failures = RecordAdapter::validate_records(&records);

    let report = ValidationReport {
        schema: SCHEMA_VERSION.to_string(),
        total_records: records.len(),
        valid_records: records.len() - failures.len(),
        invalid_records: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                record_id: f.record_id,
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report ({})", report.schema);
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                let id = err
                    .record_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("  - Record {} (index {}): {}", id, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(MoodCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn read_input(input: &Path) -> Result<String, MoodCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(input: &Path, input_format: InputFormat) -> Result<Vec<RawMoodRecord>, MoodCliError> {
    let input_data = read_input(input)?;
    let records = match input_format {
        InputFormat::Json => RecordAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&input_data)?,
    };
    Ok(records)
}

/// Seed an in-memory store with the file's valid records and read the
/// user's snapshot back through the provider
fn load_snapshot(
    input: &Path,
    input_format: InputFormat,
    user_id: UserId,
) -> Result<Snapshot, MoodCliError> {
    let records = read_records(input, input_format)?;
    let store = InMemoryStore::with_entries(RecordAdapter::to_entries(&records));
    let (mut provider, _invalidations) = SnapshotProvider::new(user_id);
    Ok(provider.current(&store).clone())
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate, MoodCliError> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| MoodCliError::InvalidDate(format!("{}: {}", s, e))),
        None => Ok(Local::now().date_naive()),
    }
}

fn format_report(report: &MoodReport) -> String {
    let mut lines = vec![
        format!("{} {}", PRODUCER_NAME, report.engine_version),
        format!("User {} on {}", report.user_id, report.generated_for),
        format!("Total entries: {}", report.total_entries),
        String::new(),
    ];

    let today = &report.today.summary;
    match today.representative {
        Some(mood) => lines.push(format!(
            "Today: {} {} ({} entries)",
            mood.emoji(),
            mood.label(),
            today.entry_count
        )),
        None => lines.push("Today: nothing logged yet".to_string()),
    }
    if report.today.timeline.visible {
        for point in &report.today.timeline.points {
            lines.push(format!(
                "  {} {:<10} at {:>5.1}%",
                point.time.format("%H:%M"),
                point.mood.label(),
                point.position
            ));
        }
    }

    if !report.insights.is_empty() {
        lines.push(String::new());
        lines.push("Insights:".to_string());
        for insight in &report.insights {
            lines.push(format!("  - {}", insight.message));
        }
    }

    lines.push(String::new());
    lines.push("Distribution:".to_string());
    for bucket in &report.distribution.buckets {
        lines.push(format!("  {} {:<10} {}", bucket.emoji, bucket.label, bucket.count));
    }

    if let Some(referral) = &report.referral {
        lines.push(String::new());
        lines.push(referral.headline.clone());
        lines.push(referral.body.clone());
        lines.push(format!("{}: {}", referral.action_label, referral.url));
    }

    lines.join("\n")
}

fn format_month(month: &CalendarMonth) -> String {
    let mut lines = vec![month.title(), " Su Mo Tu We Th Fr Sa".to_string()];
    let mut row = "    ".repeat(month.leading_padding as usize);
    let mut column = month.leading_padding as usize;

    for cell in &month.days {
        let glyph = match cell.mood {
            Some(mood) => mood.as_str().chars().next().unwrap_or('?').to_ascii_uppercase(),
            None => '.',
        };
        let today_mark = if cell.is_today { '*' } else { ' ' };
        row.push_str(&format!("{:>2}{}{}", cell.date.day(), glyph, today_mark));
        column += 1;
        if column == 7 {
            lines.push(row.trim_end().to_string());
            row = String::new();
            column = 0;
        }
    }
    if !row.is_empty() {
        lines.push(row.trim_end().to_string());
    }
    lines.join("\n")
}

// Error types

#[derive(Debug)]
enum MoodCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    InvalidDate(String),
    ValidationFailed(usize),
}

impl From<io::Error> for MoodCliError {
    fn from(e: io::Error) -> Self {
        MoodCliError::Io(e)
    }
}

impl From<EngineError> for MoodCliError {
    fn from(e: EngineError) -> Self {
        MoodCliError::Engine(e)
    }
}

impl From<serde_json::Error> for MoodCliError {
    fn from(e: serde_json::Error) -> Self {
        MoodCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MoodCliError> for CliError {
    fn from(e: MoodCliError) -> Self {
        match e {
            MoodCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MoodCliError::Engine(EngineError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check the --config file".to_string()),
            },
            MoodCliError::Engine(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches {} schema", SCHEMA_VERSION)),
            },
            MoodCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MoodCliError::InvalidDate(msg) => CliError {
                code: "INVALID_DATE".to_string(),
                message: msg,
                hint: Some("Dates use the YYYY-MM-DD format".to_string()),
            },
            MoodCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema: String,
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: Option<EntryId>,
    error: String,
}
