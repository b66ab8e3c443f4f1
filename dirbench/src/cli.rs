use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use dirbench_core::RUN_LOG_PREFIX;
use dirbench_core::driver::{DEFAULT_EXTENSIONS, DEFAULT_ITERATIONS, DEFAULT_MODES, DEFAULT_THREADS};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit one JSON result line (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "dirbench",
    version,
    about = "Benchmark harness for content-discovery scanners",
    long_about = "dirbench runs a content-discovery scanner repeatedly against a list of targets under several modes, then averages the per-run event logs into CSV reports (one per mode, one per site, and a global summary).",
    after_help = "Examples:\n  dirbench bench -w words.txt -t targets.txt -o results -x ../intellidirb\n  dirbench analyze -d results\n  dirbench timeline -d results -o results/timeline --iteration 1"
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the scanner against every target, mode and iteration
    Bench(BenchArgs),

    /// Average run logs into per-mode, per-site and global reports
    Analyze(AnalyzeArgs),

    /// Write run-over-time tables for one iteration of every (mode, site)
    Timeline(TimelineArgs),
}

#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Wordlist file handed to the scanner
    #[arg(short, long, env = "DIRBENCH_WORDLIST")]
    pub wordlist: PathBuf,

    /// File listing targets, one `URL` or `SITE URL` per line
    #[arg(short = 't', long = "targets", env = "DIRBENCH_TARGETS")]
    pub target_file: PathBuf,

    /// Directory for run logs and transcripts (created if missing)
    #[arg(short, long = "out-dir", env = "DIRBENCH_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Directory containing intellidirb.py (run through --python)
    #[arg(
        short = 'x',
        long,
        env = "DIRBENCH_EXEC_DIR",
        required_unless_present = "scanner",
        conflicts_with = "scanner"
    )]
    pub exec_dir: Option<PathBuf>,

    /// Interpreter used with --exec-dir
    #[arg(long, env = "DIRBENCH_PYTHON", default_value = "python")]
    pub python: String,

    /// Scanner program to run directly instead of --exec-dir
    #[arg(long, env = "DIRBENCH_SCANNER")]
    pub scanner: Option<PathBuf>,

    /// Extra leading argument for --scanner (repeatable)
    #[arg(long = "scanner-arg", requires = "scanner", allow_hyphen_values = true)]
    pub scanner_args: Vec<String>,

    /// Number of times to run each mode against each target
    #[arg(
        short,
        long,
        env = "DIRBENCH_ITERATIONS",
        default_value_t = DEFAULT_ITERATIONS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub iterations: u32,

    /// Scanner modes to benchmark, in run order
    #[arg(long, env = "DIRBENCH_MODES", value_delimiter = ',', default_values = DEFAULT_MODES)]
    pub modes: Vec<String>,

    /// Thread count passed to the scanner
    #[arg(
        long,
        env = "DIRBENCH_THREADS",
        default_value_t = DEFAULT_THREADS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub threads: u32,

    /// File extensions passed to the scanner (empty to omit the flag)
    #[arg(long, env = "DIRBENCH_EXTENSIONS", default_value = DEFAULT_EXTENSIONS)]
    pub extensions: String,

    /// Maximum scanners running at once within a batch (defaults to the whole batch)
    #[arg(
        long,
        env = "DIRBENCH_MAX_CONCURRENCY",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_concurrency: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Directory to read run logs from
    #[arg(short, long, env = "DIRBENCH_RESULTS_DIR")]
    pub directory: PathBuf,

    /// Directory to write reports to (defaults to --directory)
    #[arg(short, long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Create the report directory if it does not exist
    #[arg(long)]
    pub create_out_dir: bool,

    /// File name prefix of run logs
    #[arg(long, default_value = RUN_LOG_PREFIX)]
    pub prefix: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct TimelineArgs {
    /// Directory to read run logs from
    #[arg(short, long, env = "DIRBENCH_RESULTS_DIR")]
    pub directory: PathBuf,

    /// Directory to write timeline tables to (created if missing)
    #[arg(short, long = "out-dir")]
    pub out_dir: PathBuf,

    /// Iteration to chart
    #[arg(long, default_value_t = 0)]
    pub iteration: u32,

    /// File name prefix of run logs
    #[arg(long, default_value = RUN_LOG_PREFIX)]
    pub prefix: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
