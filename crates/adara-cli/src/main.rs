use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adara_core::summary::{SummaryOptions, summarize_file};
use adara_core::{ParserConfig, StreamReport};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glob::glob;
use tracing_subscriber::{EnvFilter, fmt};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ADARA_BUILD_COMMIT"),
    ", ",
    env!("ADARA_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:
  adara stream summarize run-1234.adara -o report.json
  adara stream summarise run-1234.adara --stdout --pretty
  adara stream summarize 'captures/*.adara' -o report.json --strict";

#[derive(Parser, Debug)]
#[command(name = "adara")]
#[command(version = VERSION)]
#[command(
    about = "Offline summaries of ADARA neutron live-data streams.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log filter for diagnostics on stderr (e.g. warn, debug, adara_core=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on captured ADARA streams.
    Stream {
        #[command(subcommand)]
        command: StreamCommands,
    },
}

#[derive(Subcommand, Debug)]
enum StreamCommands {
    /// Parse a captured stream and generate a versioned JSON summary report.
    #[command(aliases = ["summarise", "analyse"])]
    #[command(after_help = EXAMPLES)]
    Summarize(SummarizeArgs),
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Path (or glob matching exactly one file) of a captured ADARA stream
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if malformed packets were seen
    #[arg(long)]
    strict: bool,

    /// List malformed packet examples after parsing
    #[arg(long)]
    list_malformed: bool,

    /// Parser config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial parser buffer size in bytes
    #[arg(long)]
    initial_capacity: Option<usize>,

    /// Largest packet held whole in memory; bigger packets are streamed in chunks
    #[arg(long)]
    max_packet_size: Option<usize>,

    /// Bytes requested from the input per read
    #[arg(long)]
    read_size: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = init_logging(&cli.log_level).and_then(|()| match cli.command {
        Commands::Stream { command } => match command {
            StreamCommands::Summarize(args) => cmd_stream_summarize(args),
        },
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn init_logging(level: &str) -> Result<(), CliError> {
    let filter = EnvFilter::try_new(level).map_err(|err| {
        CliError::new(
            format!("invalid log level '{}'", level),
            Some(format!("filter error: {}", err)),
        )
    })?;
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn cmd_stream_summarize(args: SummarizeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report = if args.stdout {
        None
    } else {
        let report_path = args.report.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&report_path, &input_abs)?;
        Some(report_path)
    };

    let options = summary_options(&args)?;
    tracing::debug!(
        input = %resolved_input.display(),
        initial_capacity = options.parser.initial_capacity,
        max_capacity = options.parser.max_capacity,
        read_size = options.read_size,
        "summarizing stream"
    );

    let rep = summarize_file(&resolved_input, &options).context("stream summary failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    if args.list_malformed && !args.quiet {
        print_malformed(&rep);
    }
    let malformed = rep.summary.malformed.count;
    if args.strict && malformed > 0 {
        return Err(CliError::new(
            format!("malformed packets detected ({})", malformed),
            Some("use --list-malformed to inspect".to_string()),
        ));
    }
    Ok(())
}

/// Builds parser options from the optional config file, then flag overrides.
fn summary_options(args: &SummarizeArgs) -> Result<SummaryOptions, CliError> {
    let mut parser = match args.config.as_ref() {
        Some(path) => ParserConfig::load(path).map_err(|err| {
            CliError::new(
                format!("invalid config '{}': {}", path.display(), err),
                Some("expected JSON with initial_capacity and max_capacity".to_string()),
            )
        })?,
        None => ParserConfig::default(),
    };
    if let Some(initial) = args.initial_capacity {
        parser.initial_capacity = initial;
    }
    if let Some(max) = args.max_packet_size {
        parser.max_capacity = max;
    }
    parser.validate().map_err(|err| {
        CliError::new(
            err.to_string(),
            Some(
                "--initial-capacity must be at least 16 and at most --max-packet-size".to_string(),
            ),
        )
    })?;

    let mut options = SummaryOptions {
        parser,
        ..SummaryOptions::default()
    };
    if let Some(read_size) = args.read_size {
        if read_size == 0 {
            return Err(CliError::new("--read-size must be greater than zero", None));
        }
        options.read_size = read_size;
    }
    Ok(options)
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = report_path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                fs::canonicalize(".")
            } else {
                fs::canonicalize(parent)
            }
        })
        .transpose();
    // A parent that does not exist yet cannot hold the input.
    let Ok(Some(report_dir)) = report_dir else {
        return Ok(());
    };
    let file_name = report_path.file_name().ok_or_else(|| {
        CliError::new(
            format!("invalid report path: {}", report_path.display()),
            None,
        )
    })?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &StreamReport, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn print_malformed(rep: &StreamReport) {
    let malformed = &rep.summary.malformed;
    eprintln!("Malformed packets: {}", malformed.count);
    for example in &malformed.examples {
        eprintln!("  {}", example);
    }
    let omitted = malformed.count.saturating_sub(malformed.examples.len() as u64);
    if omitted > 0 {
        eprintln!("  ... {} more", omitted);
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a captured ADARA stream file".to_string()),
        ));
    }
    let meta = fs::metadata(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a captured ADARA stream file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single stream file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
