//! Journal CLI - Command-line interface for Synheart Journal
//!
//! Commands:
//! - log: Append a meal, symptom or emotion
//! - show: Print a stream as a table
//! - summary / top / timeline / correlate: Derived views
//! - ask: Ask a question against the raw stream files
//! - doctor: Diagnose the data directory
//! - schema: Print stream layouts

use chrono::Local;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

use synheart_journal::chat::{ChatSession, Corpus, KeywordEngine};
use synheart_journal::forms::{EmotionForm, MealForm, SymptomForm};
use synheart_journal::schema::{schema_for, ColumnKind, CURRENT_VERSION};
use synheart_journal::views::{self, ColumnStats, CorrelationView, StreamSummary, ValueCount};
use synheart_journal::{
    AppendReceipt, JournalConfig, JournalError, JournalStore, LoadPolicy, LoadedStream,
    StreamKind, StreamReader, ValidationError, JOURNAL_VERSION, PRODUCER_NAME,
};

/// Journal - Log meals, symptoms and emotions and look for patterns
#[derive(Parser)]
#[command(name = "journal")]
#[command(author = "Synheart AI Inc")]
#[command(version = JOURNAL_VERSION)]
#[command(about = "Append-only health journal with derived views", long_about = None)]
struct Cli {
    /// Directory holding the stream files
    #[arg(long, global = true, env = "JOURNAL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to journal.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on the first malformed row instead of skipping it
    #[arg(long, global = true)]
    strict: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append an entry
    Log {
        #[command(subcommand)]
        entry: LogEntry,
    },

    /// Print the rows of a stream
    Show {
        #[arg(value_parser = parse_stream)]
        stream: StreamKind,

        /// Only the most recent N rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Descriptive statistics per stream
    Summary {
        /// Stream to summarize (all streams when omitted)
        #[arg(value_parser = parse_stream)]
        stream: Option<StreamKind>,
    },

    /// Most frequent values of a field
    Top {
        #[arg(value_parser = parse_stream)]
        stream: StreamKind,

        /// Field name, e.g. food_consumed or symptom_type
        field: String,

        /// Number of values (defaults to `default_top_n` from config)
        #[arg(short)]
        n: Option<usize>,
    },

    /// Cumulative entry counts over time
    Timeline {
        /// Count entries per calendar day instead
        #[arg(long)]
        daily: bool,
    },

    /// Align symptom and emotion severities and correlate them
    Correlate {
        /// Join window in minutes; 0 joins on exact timestamps
        #[arg(long)]
        bucket_minutes: Option<u32>,
    },

    /// Ask a question about the journal (reads stdin when omitted)
    Ask { question: Option<String> },

    /// Diagnose the data directory and stream files
    Doctor,

    /// Print stream layouts
    Schema {
        #[arg(value_parser = parse_stream)]
        stream: Option<StreamKind>,
    },
}

#[derive(Subcommand)]
enum LogEntry {
    /// Log a meal
    Meal {
        /// Breakfast, Brunch, Lunch, Dinner or Snack
        #[arg(short = 't', long)]
        meal_type: String,

        /// What was eaten
        #[arg(short, long)]
        food: String,

        #[command(flatten)]
        when: When,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log a symptom
    Symptom {
        /// Stomachache, Headache, Nausea, Fatigue or Other
        #[arg(short = 't', long)]
        symptom_type: String,

        /// 1 (mild) to 10 (severe)
        #[arg(short, long)]
        severity: i64,

        #[command(flatten)]
        when: When,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log an emotion
    Emotion {
        /// Anxious, Depressed, Overwhelmed, Bored, "Doom scrolling" or Other
        #[arg(short = 't', long)]
        emotion_type: String,

        /// 1 (mild) to 10 (severe)
        #[arg(short, long)]
        severity: i64,

        #[command(flatten)]
        when: When,

        #[arg(long)]
        notes: Option<String>,
    },
}

/// Date and time of an entry; both default to now
#[derive(clap::Args)]
struct When {
    /// YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,

    /// HH:MM or HH:MM:SS
    #[arg(long)]
    time: Option<String>,
}

impl When {
    fn resolve(self) -> (String, String) {
        let now = Local::now();
        (
            self.date
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            self.time
                .unwrap_or_else(|| now.format("%H:%M:%S").to_string()),
        )
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn parse_stream(s: &str) -> Result<StreamKind, String> {
    s.parse().map_err(|e: ValidationError| e.to_string())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<JournalConfig, JournalCliError> {
    let mut config = match (&cli.config, &cli.data_dir) {
        (Some(path), _) => JournalConfig::load(path)?,
        (None, Some(dir)) => JournalConfig::load_from_dir(dir)?,
        (None, None) => JournalConfig::load_from_dir(Path::new("."))?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.strict {
        config.load_policy = LoadPolicy::Strict;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), JournalCliError> {
    let config = resolve_config(&cli)?;
    let format = cli.format;

    match cli.command {
        Commands::Log { entry } => cmd_log(&config, entry, format),
        Commands::Show { stream, limit } => cmd_show(&config, stream, limit, format),
        Commands::Summary { stream } => cmd_summary(&config, stream, format),
        Commands::Top { stream, field, n } => {
            cmd_top(&config, stream, &field, n.unwrap_or(config.default_top_n), format)
        }
        Commands::Timeline { daily } => cmd_timeline(&config, daily, format),
        Commands::Correlate { bucket_minutes } => {
            let config = match bucket_minutes {
                Some(minutes) => JournalConfig {
                    correlation_bucket_minutes: minutes,
                    ..config
                },
                None => config,
            };
            cmd_correlate(&config, format)
        }
        Commands::Ask { question } => cmd_ask(&config, question, format),
        Commands::Doctor => cmd_doctor(&config, format),
        Commands::Schema { stream } => cmd_schema(stream, format),
    }
}

fn cmd_log(
    config: &JournalConfig,
    entry: LogEntry,
    format: OutputFormat,
) -> Result<(), JournalCliError> {
    let store = JournalStore::from_config(config);

    let receipt = match entry {
        LogEntry::Meal {
            meal_type,
            food,
            when,
            notes,
        } => {
            let (date, time) = when.resolve();
            let meal = MealForm {
                date,
                time,
                meal_type,
                food_consumed: food,
                notes,
            }
            .validate()?;
            store.append(&meal)?
        }
        LogEntry::Symptom {
            symptom_type,
            severity,
            when,
            notes,
        } => {
            let (date, time) = when.resolve();
            let symptom = SymptomForm {
                date,
                time,
                symptom_type,
                severity,
                notes,
            }
            .validate()?;
            store.append(&symptom)?
        }
        LogEntry::Emotion {
            emotion_type,
            severity,
            when,
            notes,
        } => {
            let (date, time) = when.resolve();
            let emotion = EmotionForm {
                date,
                time,
                emotion_type,
                severity,
                notes,
            }
            .validate()?;
            store.append(&emotion)?
        }
    };

    emit(&receipt, format, |r: &AppendReceipt| {
        println!(
            "Logged {} entry to {}{}",
            r.stream,
            r.path.display(),
            if r.created { " (new file)" } else { "" }
        );
    })
}

fn cmd_show(
    config: &JournalConfig,
    stream: StreamKind,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), JournalCliError> {
    let mut loaded = StreamReader::from_config(config).load(stream)?;
    if let Some(limit) = limit {
        let skip = loaded.table.rows.len().saturating_sub(limit);
        loaded.table.rows.drain(..skip);
        loaded.lines.drain(..skip.min(loaded.lines.len()));
        loaded.raw.drain(..skip.min(loaded.raw.len()));
    }

    emit(&loaded, format, |l: &LoadedStream| {
        let names: Vec<&str> = l.table.columns.iter().map(|c| c.name.as_str()).collect();
        println!("{}", names.join(" | "));
        for row in &l.table.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|c| c.display().unwrap_or_default())
                .collect();
            println!("{}", cells.join(" | "));
        }
        println!("\n{} rows", l.table.len());
        print_skipped(l);
    })
}

fn print_skipped(loaded: &LoadedStream) {
    if !loaded.skipped.is_empty() {
        println!("{} malformed rows skipped:", loaded.skipped.len());
        for skipped in &loaded.skipped {
            println!("  {}", skipped);
        }
    }
}

fn cmd_summary(
    config: &JournalConfig,
    stream: Option<StreamKind>,
    format: OutputFormat,
) -> Result<(), JournalCliError> {
    let reader = StreamReader::from_config(config);
    let streams: Vec<StreamKind> = match stream {
        Some(s) => vec![s],
        None => StreamKind::ALL.to_vec(),
    };

    let mut summaries = Vec::new();
    for stream in streams {
        summaries.push(views::summarize(&reader.load(stream)?.table));
    }

    emit(&summaries, format, |summaries: &Vec<StreamSummary>| {
        for summary in summaries {
            print_summary(summary);
        }
    })
}

fn print_summary(summary: &StreamSummary) {
    println!("{}: {} entries", summary.stream, summary.count);
    for column in &summary.columns {
        match &column.stats {
            ColumnStats::Timestamp { first, last, .. } => match (first, last) {
                (Some(first), Some(last)) => {
                    println!("  {}: {} .. {}", column.name, first, last)
                }
                _ => println!("  {}: -", column.name),
            },
            ColumnStats::Categorical { frequencies, .. } => {
                println!("  {}: {}", column.name, format_counts(frequencies));
            }
            ColumnStats::Numeric(n) => {
                let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.2}", v));
                println!(
                    "  {}: count {} mean {} std {} min {} 25% {} 50% {} 75% {} max {}",
                    column.name,
                    n.count,
                    fmt(n.mean),
                    fmt(n.std),
                    fmt(n.min),
                    fmt(n.p25),
                    fmt(n.p50),
                    fmt(n.p75),
                    fmt(n.max)
                );
            }
            ColumnStats::Text { count, distinct } => {
                println!("  {}: {} present, {} distinct", column.name, count, distinct);
            }
        }
    }
}

fn format_counts(counts: &[ValueCount]) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|c| format!("{} {}", c.value, c.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_top(
    config: &JournalConfig,
    stream: StreamKind,
    field: &str,
    n: usize,
    format: OutputFormat,
) -> Result<(), JournalCliError> {
    let loaded = StreamReader::from_config(config).load(stream)?;
    let top = views::top_n(&loaded.table, field, n)?;

    emit(&top, format, |top: &Vec<ValueCount>| {
        if top.is_empty() {
            println!("No values recorded for {}.{}", stream, field);
        }
        for (rank, entry) in top.iter().enumerate() {
            println!("{:>3}. {} ({})", rank + 1, entry.value, entry.count);
        }
    })
}

fn cmd_timeline(
    config: &JournalConfig,
    daily: bool,
    format: OutputFormat,
) -> Result<(), JournalCliError> {
    let loaded = StreamReader::from_config(config).load_all()?;
    let tables: Vec<_> = loaded.iter().map(|l| &l.table).collect();

    if daily {
        #[derive(Serialize)]
        struct StreamDays {
            stream: StreamKind,
            days: Vec<views::DailyCount>,
        }
        let per_stream: Vec<StreamDays> = tables
            .iter()
            .map(|t| StreamDays {
                stream: t.stream,
                days: views::daily_counts(t),
            })
            .collect();

        return emit(&per_stream, format, |per_stream: &Vec<StreamDays>| {
            for entry in per_stream {
                println!("{}:", entry.stream);
                for day in &entry.days {
                    println!("  {}  {}", day.date, day.count);
                }
            }
        });
    }

    let series = views::time_series(&tables);
    emit(&series, format, |series: &Vec<views::TimeSeries>| {
        for s in series {
            println!("{}:", s.stream);
            for point in &s.points {
                println!("  {}  {}", point.timestamp, point.cumulative_count);
            }
        }
    })
}

fn cmd_correlate(config: &JournalConfig, format: OutputFormat) -> Result<(), JournalCliError> {
    let reader = StreamReader::from_config(config);
    let symptoms = reader.load(StreamKind::Symptoms)?;
    let emotions = reader.load(StreamKind::Emotions)?;
    let view = views::correlate(&[&symptoms.table, &emotions.table], config.alignment());

    emit(&view, format, |view: &CorrelationView| {
        match view.alignment {
            views::Alignment::Exact => println!(
                "Aligned on exact timestamps; entries logged even a second apart are not matched (see --bucket-minutes)"
            ),
            views::Alignment::Bucket { width_seconds } => {
                println!("Aligned on {}-minute windows", width_seconds / 60)
            }
        }
        println!("{} joined rows over {}", view.rows.len(), view.columns.join(", "));
        for pair in &view.pairs {
            match pair.coefficient {
                Some(r) => println!("  {} ~ {}: r = {:.3} (n = {})", pair.left, pair.right, r, pair.n),
                None => println!(
                    "  {} ~ {}: undefined (n = {}, needs 2+ aligned rows with variance)",
                    pair.left, pair.right, pair.n
                ),
            }
        }
    })
}

fn cmd_ask(
    config: &JournalConfig,
    question: Option<String>,
    format: OutputFormat,
) -> Result<(), JournalCliError> {
    let question = match question {
        Some(q) => q,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        None => return Err(JournalCliError::NoQuestion),
    };

    let corpus = Corpus::from_store(&JournalStore::from_config(config))?;
    let (session, answer) = ChatSession::new().ask(&KeywordEngine::default(), &corpus, &question);
    let answer = answer?;

    match format {
        OutputFormat::Text => {
            print!("{}", answer);
            Ok(())
        }
        _ => emit(&session.end(), format, |_| {}),
    }
}

fn cmd_doctor(config: &JournalConfig, format: OutputFormat) -> Result<(), JournalCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "journal_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Journal version {}", JOURNAL_VERSION),
    });

    let data_dir = &config.data_dir;
    checks.push(if data_dir.is_dir() {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Ok,
            message: format!("Data directory {}", data_dir.display()),
        }
    } else if data_dir.exists() {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Error,
            message: format!("{} is not a directory", data_dir.display()),
        }
    } else {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "{} does not exist yet; it is created on the first entry",
                data_dir.display()
            ),
        }
    });

    // Always lenient here so every bad row is counted
    let reader = StreamReader::new(data_dir.clone(), LoadPolicy::Lenient);
    for stream in StreamKind::ALL {
        let name = format!("stream.{}", stream);
        let path = data_dir.join(stream.file_name());
        if !path.exists() {
            checks.push(DoctorCheck {
                name,
                status: CheckStatus::Warning,
                message: format!("{} not created yet (no entries)", stream.file_name()),
            });
            continue;
        }

        checks.push(match reader.load(stream) {
            Ok(loaded) => {
                let version = loaded.schema_version.unwrap_or(CURRENT_VERSION);
                let mut notes = Vec::new();
                if version != CURRENT_VERSION {
                    notes.push(format!("legacy layout v{version}, kept for new rows"));
                }
                if !loaded.skipped.is_empty() {
                    notes.push(format!("{} malformed rows", loaded.skipped.len()));
                }
                DoctorCheck {
                    name,
                    status: if notes.is_empty() {
                        CheckStatus::Ok
                    } else {
                        CheckStatus::Warning
                    },
                    message: format!(
                        "{} rows, schema v{}{}",
                        loaded.table.len(),
                        version,
                        if notes.is_empty() {
                            String::new()
                        } else {
                            format!(" ({})", notes.join("; "))
                        }
                    ),
                }
            }
            Err(e) => DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        });
    }

    checks.push(DoctorCheck {
        name: "config".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "load_policy {:?}, lock_appends {}, alignment {:?}",
            config.load_policy,
            config.lock_appends,
            config.alignment()
        ),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: JOURNAL_VERSION.to_string(),
        checks,
    };

    emit(&report, format, |report: &DoctorReport| {
        println!("Journal Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    })?;

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(JournalCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(stream: Option<StreamKind>, format: OutputFormat) -> Result<(), JournalCliError> {
    let streams: Vec<StreamKind> = match stream {
        Some(s) => vec![s],
        None => StreamKind::ALL.to_vec(),
    };

    let layouts: Vec<SchemaInfo> = streams
        .into_iter()
        .map(|stream| {
            let schema = schema_for(stream);
            SchemaInfo {
                stream,
                file: stream.file_name(),
                version: schema.current().version,
                columns: schema
                    .columns
                    .iter()
                    .map(|c| ColumnInfo {
                        name: c.name,
                        kind: c.kind,
                        required: c.required,
                    })
                    .collect(),
                legacy_headers: schema
                    .versions
                    .iter()
                    .filter(|v| !v.is_current())
                    .map(|v| v.header.join(","))
                    .collect(),
            }
        })
        .collect();

    emit(&layouts, format, |layouts: &Vec<SchemaInfo>| {
        for info in layouts {
            println!("{} ({}, v{})", info.stream, info.file, info.version);
            for column in &info.columns {
                println!(
                    "  {:<16} {:?}{}",
                    column.name,
                    column.kind,
                    if column.required { "" } else { " (optional)" }
                );
            }
            for header in &info.legacy_headers {
                println!("  legacy header: {}", header);
            }
        }
    })
}

// Helper functions

fn emit<T: Serialize>(
    value: &T,
    format: OutputFormat,
    text: impl FnOnce(&T),
) -> Result<(), JournalCliError> {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum JournalCliError {
    Journal(JournalError),
    Io(io::Error),
    Json(serde_json::Error),
    NoQuestion,
    DoctorFailed,
}

impl From<JournalError> for JournalCliError {
    fn from(e: JournalError) -> Self {
        JournalCliError::Journal(e)
    }
}

impl From<ValidationError> for JournalCliError {
    fn from(e: ValidationError) -> Self {
        JournalCliError::Journal(JournalError::Validation(e))
    }
}

impl From<io::Error> for JournalCliError {
    fn from(e: io::Error) -> Self {
        JournalCliError::Io(e)
    }
}

impl From<serde_json::Error> for JournalCliError {
    fn from(e: serde_json::Error) -> Self {
        JournalCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<JournalCliError> for CliError {
    fn from(e: JournalCliError) -> Self {
        match e {
            JournalCliError::Journal(e) => {
                let (code, hint) = match &e {
                    JournalError::Validation(_) => {
                        ("VALIDATION_ERROR", Some("Check the entry values and retry"))
                    }
                    JournalError::Storage(_) => {
                        ("STORAGE_ERROR", Some("Check the data directory path and permissions"))
                    }
                    JournalError::Parse(_) => (
                        "PARSE_ERROR",
                        Some("Run without --strict to skip malformed rows, or 'journal doctor' to list them"),
                    ),
                    JournalError::SchemaMismatch { .. } => (
                        "SCHEMA_MISMATCH",
                        Some("Run 'journal schema' to see the recognised headers"),
                    ),
                    JournalError::UnknownField { .. } => (
                        "UNKNOWN_FIELD",
                        Some("Run 'journal schema' to list the fields of each stream"),
                    ),
                    JournalError::Config(_) => ("CONFIG_ERROR", Some("Check journal.toml")),
                    JournalError::Json(_) => ("JSON_ERROR", Some("Check JSON syntax")),
                    JournalError::Chat(_) => ("CHAT_ERROR", None),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
            JournalCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            JournalCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            JournalCliError::NoQuestion => CliError {
                code: "NO_QUESTION".to_string(),
                message: "No question given".to_string(),
                hint: Some("Pass the question as an argument or pipe it on stdin".to_string()),
            },
            JournalCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[derive(serde::Serialize)]
struct SchemaInfo {
    stream: StreamKind,
    file: &'static str,
    version: u32,
    columns: Vec<ColumnInfo>,
    legacy_headers: Vec<String>,
}

#[derive(serde::Serialize)]
struct ColumnInfo {
    name: &'static str,
    kind: ColumnKind,
    required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "journal",
            "top",
            "meals",
            "food_consumed",
            "--strict",
            "--data-dir",
            data_dir,
        ])
        .unwrap();

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.load_policy, LoadPolicy::Strict);
        assert_eq!(config.default_top_n, 5);
    }

    #[test]
    fn test_unknown_stream_rejected_by_parser() {
        assert!(Cli::try_parse_from(["journal", "show", "sleep"]).is_err());
        assert!(Cli::try_parse_from(["journal", "show", "Symptom"]).is_ok());
    }

    #[test]
    fn test_error_codes() {
        let err = CliError::from(JournalCliError::from(ValidationError::SeverityOutOfRange {
            value: 11,
        }));
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert!(err.message.contains("between 1 and 10"));

        let err = CliError::from(JournalCliError::from(JournalError::UnknownField {
            stream: StreamKind::Meals,
            field: "severity".to_string(),
        }));
        assert_eq!(err.code, "UNKNOWN_FIELD");
        assert!(err.hint.is_some());
    }
}
