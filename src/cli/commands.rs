//! Command implementations for the CLI

use std::io::IsTerminal;

use crate::config::{CompilerSpec, HarnessConfig, LeakDetector, RobustnessPolicy};
use crate::report::ConsoleReporter;
use crate::runner::run_harness;

use super::{Cli, CliResult, ExitCode};

/// Build the harness configuration from parsed arguments.
pub fn config_from_cli(cli: &Cli) -> HarnessConfig {
    let mut config = HarnessConfig::new()
        .with_variant(cli.mode.variant())
        .with_project_dir(&cli.project_dir)
        .with_work_dir(&cli.work_dir)
        .with_compiler(CompilerSpec {
            program: cli.cc.clone(),
            extra_flags: cli.cflags.clone(),
        })
        .with_stress_descriptors(cli.stress_fds)
        .with_hardcore(!cli.no_hardcore);
    if !cli.buffers.is_empty() {
        config = config.with_buffer_sizes(cli.buffers.clone());
    }
    if cli.valgrind {
        config = config.with_leak_detector(LeakDetector::new(&cli.leak_detector, cli.leak_exit_code));
    }
    if cli.strict_robustness {
        config = config.with_robustness(RobustnessPolicy::Scored);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(path) = &cli.json {
        config = config.with_json_report(path);
    }
    config
}

pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Run the harness and map the report to a process exit code.
pub fn check(config: &HarnessConfig, verbose: bool, color: bool) -> CliResult<ExitCode> {
    let mut reporter = ConsoleReporter::new(verbose, color);
    let report = run_harness(config, &mut reporter)?;
    if let Some(path) = &config.json_report {
        println!("report written to {}", path.display());
    }
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
