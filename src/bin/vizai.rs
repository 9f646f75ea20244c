//! VizAI CLI - Command-line interface for VizAI activity aggregation
//!
//! Commands:
//! - report: Build the full daily report (summary table, hourly series, peaks)
//! - hourly: Print the 24-bucket hourly series
//! - peaks: Rank peak hours by duration or occurrences
//! - validate: Validate activity records
//! - sample: Emit the fixed sample day or a seeded mock day

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{FixedOffset, Local, NaiveDate};

use vizai_activity::activity::adapter::{ActivityAdapter, RawActivityRecord};
use vizai_activity::activity::report::DailyReport;
use vizai_activity::activity::types::{
    ActivityRecord, DayWindow, HourlySeries, PeakEntry, PeakMetric,
};
use vizai_activity::activity::{build_hourly_series, filter_by_behaviors, find_peak_hours};
use vizai_activity::config::{parse_utc_offset, ReportConfig};
use vizai_activity::mock::{sample_day, MockGenerator};
use vizai_activity::store::{FilterState, JsonFileStore};
use vizai_activity::{format_ms, ReportProcessor, VIZAI_VERSION};

/// VizAI - Animal-behavior activity aggregation
#[derive(Parser)]
#[command(name = "vizai")]
#[command(version = VIZAI_VERSION)]
#[command(about = "Aggregate animal-behavior activity records into daily dashboard metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads records for a day
#[derive(clap::Args)]
struct DayArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "auto")]
    input_format: InputFormat,

    /// Day to aggregate (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,

    /// Local UTC offset (e.g. "+02:00"); overrides the config file
    #[arg(long)]
    utc_offset: Option<String>,

    /// Report config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only keep these behaviors (comma separated); overrides the config file
    #[arg(long, value_delimiter = ',')]
    behaviors: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the daily report
    Report {
        #[command(flatten)]
        day: DayArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "table")]
        output_format: OutputFormat,

        /// Number of peak hours per metric
        #[arg(long)]
        top_n: Option<usize>,

        /// State file remembering the behavior filter between runs
        #[arg(long)]
        state: Option<PathBuf>,

        /// Store the --behaviors selection in the state file
        #[arg(long, requires = "state")]
        remember: bool,
    },

    /// Print the hourly series
    Hourly {
        #[command(flatten)]
        day: DayArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank peak hours
    Peaks {
        #[command(flatten)]
        day: DayArgs,

        /// Ranking metric; defaults to the config's peak_metric
        #[arg(long)]
        by: Option<PeakBy>,

        /// Number of hours to list
        #[arg(long)]
        top_n: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate activity records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Offset for timestamps without one
        #[arg(long, default_value = "+00:00")]
        utc_offset: String,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Emit mock activity records
    Sample {
        /// Day to generate (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Local UTC offset
        #[arg(long, default_value = "+00:00")]
        utc_offset: String,

        /// Seed for a generated day; without it the fixed sample day is emitted
        #[arg(long)]
        seed: Option<u64>,

        /// Records to generate with --seed
        #[arg(long, default_value = "24")]
        count: usize,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: RecordFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Detect from the first character
    Auto,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable tables
    Table,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum RecordFormat {
    /// Newline-delimited JSON
    Ndjson,
    /// Compact JSON array
    Json,
    /// Pretty-printed JSON array
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeakBy {
    Duration,
    Occurrences,
}

impl From<PeakBy> for PeakMetric {
    fn from(by: PeakBy) -> Self {
        match by {
            PeakBy::Duration => PeakMetric::Duration,
            PeakBy::Occurrences => PeakMetric::Occurrences,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliErrorReport::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Report {
            day,
            output,
            output_format,
            top_n,
            state,
            remember,
        } => cmd_report(&day, &output, output_format, top_n, state.as_deref(), remember),

        Commands::Hourly { day, json } => cmd_hourly(&day, json),

        Commands::Peaks {
            day,
            by,
            top_n,
            json,
        } => cmd_peaks(&day, by, top_n, json),

        Commands::Validate {
            input,
            input_format,
            utc_offset,
            json,
        } => cmd_validate(&input, input_format, &utc_offset, json),

        Commands::Sample {
            date,
            utc_offset,
            seed,
            count,
            output_format,
        } => cmd_sample(date.as_deref(), &utc_offset, seed, count, output_format),
    }
}

/// Records and window for a day, after config resolution
struct LoadedDay {
    config: ReportConfig,
    window: DayWindow,
    records: Vec<ActivityRecord>,
}

fn load_day(args: &DayArgs) -> Result<LoadedDay, CliError> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(offset) = &args.utc_offset {
        config.utc_offset = offset.as_str().into();
    }
    if !args.behaviors.is_empty() {
        config.behaviors = args.behaviors.clone();
    }

    let offset = config.resolve_offset()?;
    let window = resolve_window(args.date.as_deref(), offset)?;

    let raw = read_records(&args.input, &args.input_format)?;
    if raw.is_empty() {
        return Err(CliError::NoRecords);
    }
    let records = ActivityAdapter::to_records(&raw, offset)?;

    Ok(LoadedDay {
        config,
        window,
        records,
    })
}

fn cmd_report(
    args: &DayArgs,
    output: &Path,
    output_format: OutputFormat,
    top_n: Option<usize>,
    state: Option<&Path>,
    remember: bool,
) -> Result<(), CliError> {
    let LoadedDay {
        mut config,
        window,
        records,
    } = load_day(args)?;
    if let Some(top_n) = top_n {
        config.top_n = top_n;
    }
    let lead = config.peak_metric;

    let report = match state {
        Some(path) => {
            let store = JsonFileStore::open(path)?;
            // a non-empty config selection overrides the stored one unless it is being stored
            let remembered = if remember {
                std::mem::take(&mut config.behaviors)
            } else {
                Vec::new()
            };
            let mut processor = ReportProcessor::with_store(config, store);
            if remember {
                processor.set_filter(&FilterState::from_behaviors(remembered));
            }
            processor.process_records(&records, &window)
        }
        None => ReportProcessor::new(config).process_records(&records, &window),
    };

    let rendered = match output_format {
        OutputFormat::Table => render_report_table(&report, lead),
        OutputFormat::Json => serde_json::to_string(&report)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)? + "\n",
    };
    write_output(output, &rendered)
}

fn cmd_hourly(args: &DayArgs, json: bool) -> Result<(), CliError> {
    let loaded = load_day(args)?;
    let records = apply_config_filter(&loaded);
    let series = build_hourly_series(&records, loaded.window.day_start);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print!("{}", render_hourly_table(&series));
    }
    Ok(())
}

fn cmd_peaks(args: &DayArgs, by: Option<PeakBy>, top_n: Option<usize>, json: bool) -> Result<(), CliError> {
    let loaded = load_day(args)?;
    let records = apply_config_filter(&loaded);
    let series = build_hourly_series(&records, loaded.window.day_start);
    let metric = by.map_or(loaded.config.peak_metric, PeakMetric::from);
    let peaks = find_peak_hours(&series, metric, top_n.unwrap_or(loaded.config.top_n));

    if json {
        println!("{}", serde_json::to_string_pretty(&peaks)?);
    } else {
        for (rank, entry) in peaks.iter().enumerate() {
            println!("{:>2}. {:02}:00  {}", rank + 1, entry.hour, format_peak(metric, entry));
        }
    }
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    utc_offset: &str,
    json: bool,
) -> Result<(), CliError> {
    let offset = parse_utc_offset(utc_offset)?;
    let raw = read_records(input, &input_format)?;
    let failures = ActivityAdapter::validate_records(&raw, offset);

    let report = ValidationReport {
        total_records: raw.len(),
        valid_records: raw.len() - failures.len(),
        invalid_records: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                record_id: f.record_id.clone(),
                error: f.error.to_string(),
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
                    err.record_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(CliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_sample(
    date: Option<&str>,
    utc_offset: &str,
    seed: Option<u64>,
    count: usize,
    output_format: RecordFormat,
) -> Result<(), CliError> {
    let offset = parse_utc_offset(utc_offset)?;
    let window = resolve_window(date, offset)?;

    let records = match seed {
        Some(seed) => MockGenerator::new(seed).generate_day(&window, count),
        None => sample_day(window.day_start.date_naive(), offset)?,
    };

    match output_format {
        RecordFormat::Ndjson => {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        RecordFormat::Json => println!("{}", serde_json::to_string(&records)?),
        RecordFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

// Helper functions

fn resolve_window(date: Option<&str>, offset: FixedOffset) -> Result<DayWindow, CliError> {
    match date {
        Some(date) => Ok(DayWindow::parse_date(date, offset)?),
        None => {
            let today: NaiveDate = Local::now().with_timezone(&offset).date_naive();
            Ok(DayWindow::for_date(today, offset)?)
        }
    }
}

fn apply_config_filter(loaded: &LoadedDay) -> Vec<ActivityRecord> {
    let filter = FilterState::from_behaviors(loaded.config.behaviors.iter().cloned());
    filter_by_behaviors(&loaded.records, &filter.behaviors)
}

fn read_records(input: &Path, format: &InputFormat) -> Result<Vec<RawActivityRecord>, CliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            log::warn!("reading records from the terminal; finish with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match format {
        InputFormat::Auto => ActivityAdapter::parse_auto(&input_data)?,
        InputFormat::Ndjson => ActivityAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => ActivityAdapter::parse_array(&input_data)?,
    };
    Ok(records)
}

fn write_output(output: &Path, data: &str) -> Result<(), CliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_peak(metric: PeakMetric, entry: &PeakEntry) -> String {
    match metric {
        PeakMetric::Duration => format_ms(entry.total as f64),
        PeakMetric::Occurrences => entry.total.to_string(),
    }
}

fn render_report_table(report: &DailyReport, lead: PeakMetric) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Daily Activity {} .. {} ({} records)\n",
        report.window.start, report.window.end, report.record_count
    ));
    if !report.filter.is_empty() {
        out.push_str(&format!("Filter: {}\n", report.filter.join(", ")));
    }
    out.push('\n');

    out.push_str(&format!(
        "{:<16} {:>6} {:>8} {:>8} {:>7}\n",
        "Behavior", "Count", "Total", "Avg", "Day"
    ));
    for row in &report.behaviors {
        out.push_str(&format!(
            "{:<16} {:>6} {:>8} {:>8} {:>7}\n",
            row.behavior, row.occurrences, row.total_duration, row.avg_duration, row.percent
        ));
    }

    out.push('\n');
    for (metric, peaks) in report.peaks.ordered(lead) {
        match metric {
            PeakMetric::Duration => out.push_str("Peak hours by duration:\n"),
            PeakMetric::Occurrences => out.push_str("Peak hours by occurrences:\n"),
        }
        for entry in peaks {
            out.push_str(&format!("  {:02}:00  {}\n", entry.hour, format_peak(metric, entry)));
        }
    }

    if !report.flags.is_empty() {
        let flags: Vec<String> = report.flags.iter().map(|f| format!("{f:?}")).collect();
        out.push_str(&format!("\nFlags: {}\n", flags.join(", ")));
    }
    out
}

fn render_hourly_table(series: &HourlySeries) -> String {
    let mut out = format!("{:<6} {:>8} {:>6}  Behaviors\n", "Hour", "Total", "Count");
    for bucket in &series.hours {
        let behaviors: Vec<String> = bucket
            .totals_by_behavior
            .iter()
            .map(|(name, totals)| format!("{}={}", name, format_ms(totals.duration_ms as f64)))
            .collect();
        out.push_str(&format!(
            "{:02}:00  {:>8} {:>6}  {}\n",
            bucket.hour,
            format_ms(bucket.total_duration_ms as f64),
            bucket.total_occurrences,
            behaviors.join(" ")
        ));
    }
    out
}

// Error types

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Aggregate(vizai_activity::AggregateError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<vizai_activity::AggregateError> for CliError {
    fn from(e: vizai_activity::AggregateError) -> Self {
        CliError::Aggregate(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliErrorReport {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliError> for CliErrorReport {
    fn from(e: CliError) -> Self {
        match e {
            CliError::Io(e) => CliErrorReport {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliError::Aggregate(e) => CliErrorReport {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'vizai validate' for per-record details".to_string()),
            },
            CliError::Json(e) => CliErrorReport {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliError::NoRecords => CliErrorReport {
                code: "NO_RECORDS".to_string(),
                message: "No activity records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CliError::ValidationFailed(count) => CliErrorReport {
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
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: Option<String>,
    error: String,
}
