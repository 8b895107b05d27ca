//! CLI module for linecheck
//!
//! `linecheck [mandatory|bonus] [options]` builds one verification program per buffer size against the line reader in
//! the project directory, runs them, then runs the hardcore suite.
//!
//! ## Modules
//!
//! - `commands` - Turning parsed arguments into a harness run
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use linecheck_core::Variant;
use linecheck_core::catalog::DEFAULT_STRESS_DESCRIPTORS;

use crate::config::{DEFAULT_COMPILER, DEFAULT_LEAK_DETECTOR, DEFAULT_LEAK_EXIT_CODE, DEFAULT_WORK_DIR};
use crate::errors::HarnessError;
use crate::version::LINECHECK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// The run completed but something scored did not pass.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run could not be carried out.
    pub const ABORTED: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        // miette's Debug rendering is the full report: message, cause chain, code and help.
        let report = miette::Report::new(err);
        CliError::new(format!("{report:?}"), ExitCode::ABORTED)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Which API variant of the line reader to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Single descriptor: get_next_line.c, get_next_line_utils.c, get_next_line.h
    Mandatory,
    /// Multiple descriptors: the *_bonus.c / *_bonus.h files
    Bonus,
}

impl Mode {
    pub fn variant(self) -> Variant {
        match self {
            Mode::Mandatory => Variant::Single,
            Mode::Bonus => Variant::Multi,
        }
    }
}

/// Conformance and stress harness for get_next_line style line readers
#[derive(Parser, Debug)]
#[command(name = "linecheck")]
#[command(version = LINECHECK_VERSION)]
#[command(about = "Conformance and stress harness for get_next_line style line readers", long_about = None)]
pub struct Cli {
    /// Variant to check
    #[arg(value_enum, default_value_t = Mode::Mandatory)]
    pub mode: Mode,

    /// Run verification programs under the leak detector
    #[arg(long = "valgrind", visible_alias = "leak-check")]
    pub valgrind: bool,

    /// Leak detector program (must accept valgrind's options)
    #[arg(long, value_name = "PROG", default_value = DEFAULT_LEAK_DETECTOR)]
    pub leak_detector: String,

    /// Exit code the leak detector reports errors with
    #[arg(long, value_name = "CODE", default_value_t = DEFAULT_LEAK_EXIT_CODE)]
    pub leak_exit_code: i32,

    /// Comma-separated buffer sizes (default: 1,2,42,1024,10000)
    #[arg(long, value_name = "LIST", value_delimiter = ',', value_parser = parse_buffer_size)]
    pub buffers: Vec<NonZeroU64>,

    /// Directory holding the line reader sources
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Directory for fixtures and build artifacts
    #[arg(long, value_name = "DIR", default_value = DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,

    /// C compiler
    #[arg(long, value_name = "PROG", default_value = DEFAULT_COMPILER)]
    pub cc: String,

    /// Extra compiler flag (repeatable)
    #[arg(long = "cflag", value_name = "FLAG", allow_hyphen_values = true)]
    pub cflags: Vec<String>,

    /// Descriptors the bonus stress opens at once
    #[arg(long, value_name = "N", default_value_t = DEFAULT_STRESS_DESCRIPTORS)]
    pub stress_fds: usize,

    /// Count crashes on binary and fuzz input as failures
    #[arg(long)]
    pub strict_robustness: bool,

    /// Skip the hardcore suite
    #[arg(long)]
    pub no_hardcore: bool,

    /// Seed for the randomized fixtures
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Write the run report as JSON
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Print compile commands and child stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,
}

fn parse_buffer_size(raw: &str) -> Result<NonZeroU64, String> {
    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a positive integer"))?;
    NonZeroU64::new(value).ok_or_else(|| "buffer sizes must be at least 1".to_string())
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = commands::config_from_cli(&cli);
    let color = !cli.no_color && commands::stdout_is_terminal();
    commands::check(&config, cli.verbose, color)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["linecheck"]).unwrap();
        assert_eq!(cli.mode, Mode::Mandatory);
        assert!(!cli.valgrind);
        assert!(cli.buffers.is_empty());
        assert_eq!(cli.leak_exit_code, 42);
        assert_eq!(cli.stress_fds, 30);
        assert_eq!(cli.work_dir, PathBuf::from(".linecheck"));
        assert_eq!(cli.cc, "cc");
    }

    #[test]
    fn test_cli_parse_bonus_with_valgrind() {
        let cli = Cli::try_parse_from(["linecheck", "bonus", "--valgrind"]).unwrap();
        assert_eq!(cli.mode.variant(), Variant::Multi);
        assert!(cli.valgrind);

        let cli = Cli::try_parse_from(["linecheck", "--leak-check"]).unwrap();
        assert!(cli.valgrind);
    }

    #[test]
    fn test_cli_parse_buffers() {
        let cli = Cli::try_parse_from(["linecheck", "--buffers", "1,42,9999"]).unwrap();
        let sizes: Vec<u64> = cli.buffers.iter().map(|n| n.get()).collect();
        assert_eq!(sizes, vec![1, 42, 9999]);
    }

    #[test]
    fn test_cli_rejects_zero_buffer() {
        assert!(Cli::try_parse_from(["linecheck", "--buffers", "1,0"]).is_err());
        assert!(Cli::try_parse_from(["linecheck", "--buffers", "abc"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["linecheck", "turbo"]).is_err());
    }

    #[test]
    fn test_cli_parse_cflags_and_paths() {
        let cli = Cli::try_parse_from([
            "linecheck",
            "-C",
            "../gnl",
            "--cflag",
            "-O2",
            "--cflag=-fsanitize=address",
            "--json",
            "out/run.json",
            "--seed",
            "7",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.project_dir, PathBuf::from("../gnl"));
        assert_eq!(cli.cflags, vec!["-O2", "-fsanitize=address"]);
        assert_eq!(cli.json, Some(PathBuf::from("out/run.json")));
        assert_eq!(cli.seed, Some(7));
        assert!(cli.verbose);
    }

    #[test]
    fn test_harness_error_aborts() {
        let err: CliError = HarnessError::InvalidConfig("no buffers".to_string()).into();
        assert_eq!(err.exit_code, ExitCode::ABORTED);
        assert!(err.message.contains("no buffers"));
    }
}
