//! infer-test: command-line driver for HDL resource-inference regression tests.
//!
//! Provides `infer-test run` to synthesize every configuration of a test
//! specification and judge its resource usage, `infer-test files` and
//! `infer-test matrix` to inspect a specification without synthesizing, and
//! `infer-test version` to query a backend's toolchain.

#![warn(missing_docs)]

mod files;
mod matrix;
mod run;
mod telemetry;
mod version;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Default synthesis backend.
const DEFAULT_TOOL: &str = "cologne";

/// infer-test: check that HDL entities infer the expected device primitives.
#[derive(Parser, Debug)]
#[command(name = "infer-test", version, about = "HDL resource-inference regression tests")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize every configuration and check its resource usage.
    Run(RunArgs),
    /// Print the resolved source files of a specification.
    Files(SpecArgs),
    /// Print entities, configurations and effective generics.
    Matrix(MatrixArgs),
    /// Print the version of a synthesis backend.
    Version {
        /// Synthesis backend to query.
        #[arg(short, long, default_value = DEFAULT_TOOL)]
        tool: String,
    },
}

/// Arguments for the `infer-test run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the YAML test specification.
    pub spec: PathBuf,

    /// Synthesis backend to run.
    #[arg(short, long, default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// Directory receiving one job directory per configuration.
    #[arg(short, long, default_value = "build/inference")]
    pub output_dir: PathBuf,

    /// Absolute deviation allowed between residual and expected usage.
    #[arg(long, default_value_t = 0.0)]
    pub tolerance: f64,

    /// Deviation allowed as a fraction of the expected usage.
    #[arg(long, default_value_t = 0.0)]
    pub relative_tolerance: f64,

    /// Substring filter for entity names.
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Output format for the run report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments naming a specification file.
#[derive(Parser, Debug)]
pub struct SpecArgs {
    /// Path to the YAML test specification.
    pub spec: PathBuf,
}

/// Arguments for the `infer-test matrix` subcommand.
#[derive(Parser, Debug)]
pub struct MatrixArgs {
    /// Path to the YAML test specification.
    pub spec: PathBuf,

    /// Backend whose tool generics are applied.
    #[arg(short, long, default_value = DEFAULT_TOOL)]
    pub tool: String,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Run report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
    };
    telemetry::init_tracing(&global);

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Files(ref args) => files::run(args, &global),
        Command::Matrix(ref args) => matrix::run(args, &global),
        Command::Version { ref tool } => version::run(tool, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
