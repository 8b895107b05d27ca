//! Running and classifying verification programs.

use std::path::{Path, PathBuf};

use linecheck_core::markers::{self, CheckFailure, ScoreTally};
use serde::Serialize;

use crate::config::LeakDetector;
use crate::process::{ExitState, ProcessOutput, ProcessSpec};

/// Bytes of stdout kept for outcomes whose output is only diagnostic (dump-mode runs over large fixtures).
pub const DIAGNOSTIC_OUTPUT_LIMIT: usize = 4096;

/// Final verdict on one program run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Pass,
    Fail,
    Crash,
    Leak,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Pass => "PASS",
            Classification::Fail => "FAIL",
            Classification::Crash => "CRASH",
            Classification::Leak => "LEAK",
        }
    }

    pub fn is_pass(self) -> bool {
        self == Classification::Pass
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a verification run.
///
/// `leak_exit_code` is `Some` only when the run was wrapped by the leak detector. The leak code wins over any other
/// nonzero exit; a missing score line counts as a failed run, and so does a score line whose total differs from
/// `expected_total` when one is given.
pub fn classify(
    exit: Option<ExitState>,
    leak_exit_code: Option<i32>,
    tally: Option<ScoreTally>,
    expected_total: Option<u32>,
) -> Classification {
    let Some(exit) = exit else {
        return Classification::Crash;
    };
    if let (Some(code), Some(leak)) = (exit.code(), leak_exit_code) {
        if code == leak {
            return Classification::Leak;
        }
    }
    if !exit.success() {
        return Classification::Crash;
    }
    match tally {
        Some(tally) if tally.is_perfect() && expected_total.is_none_or(|total| tally.total == total) => {
            Classification::Pass
        }
        _ => Classification::Fail,
    }
}

/// Everything observed about one program run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub command: String,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub classification: Classification,
    pub tally: Option<ScoreTally>,
    pub failures: Vec<CheckFailure>,
    pub duration_ms: u64,
}

impl ExecutionOutcome {
    /// Build an outcome from a finished process, parsing its score line and failure blocks.
    pub fn from_output(output: ProcessOutput, leak_exit_code: Option<i32>, expected_total: Option<u32>) -> Self {
        let tally = ScoreTally::find(&output.stdout);
        let failures = markers::parse_failures(&output.stdout);
        let classification = classify(Some(output.exit), leak_exit_code, tally, expected_total);
        Self {
            command: output.command,
            exit_code: output.exit.code(),
            signal: output.exit.signal(),
            stdout: output.stdout,
            stderr: output.stderr,
            classification,
            tally,
            failures,
            duration_ms: u64::try_from(output.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Outcome for a program that could not be launched at all.
    pub fn launch_failure(command: String, err: &std::io::Error) -> Self {
        Self {
            command,
            exit_code: None,
            signal: None,
            stdout: String::new(),
            stderr: format!("failed to launch: {err}"),
            classification: Classification::Crash,
            tally: None,
            failures: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Cap stdout at [`DIAGNOSTIC_OUTPUT_LIMIT`] bytes, on a character boundary.
    pub fn truncated(mut self) -> Self {
        if self.stdout.len() > DIAGNOSTIC_OUTPUT_LIMIT {
            let mut end = DIAGNOSTIC_OUTPUT_LIMIT;
            while !self.stdout.is_char_boundary(end) {
                end -= 1;
            }
            let dropped = self.stdout.len() - end;
            self.stdout.truncate(end);
            self.stdout.push_str(&format!("\n... ({dropped} more bytes)\n"));
        }
        self
    }

    /// The process ended normally with exit code 0.
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short description of how the process ended.
    pub fn termination(&self) -> String {
        match (self.exit_code, self.signal) {
            (Some(code), _) => format!("exit code {code}"),
            (None, Some(signal)) => format!("killed by signal {signal}"),
            (None, None) => "did not start".to_string(),
        }
    }
}

/// Runs verification programs from the fixture directory.
#[derive(Debug, Clone)]
pub struct ExecutionHarness {
    fixtures_dir: PathBuf,
    leak_detector: Option<LeakDetector>,
    expected_total: Option<u32>,
}

impl ExecutionHarness {
    pub fn new(fixtures_dir: impl Into<PathBuf>, leak_detector: Option<LeakDetector>) -> Self {
        Self {
            fixtures_dir: fixtures_dir.into(),
            leak_detector,
            expected_total: None,
        }
    }

    /// Require verification score lines to report exactly `total` checks.
    pub fn with_expected_total(mut self, total: usize) -> Self {
        self.expected_total = Some(u32::try_from(total).unwrap_or(u32::MAX));
        self
    }

    /// Run `artifact` in verification mode and classify the result.
    #[tracing::instrument(skip_all, fields(artifact = %artifact.display()))]
    pub fn run_verification(&self, artifact: &Path) -> ExecutionOutcome {
        let mut spec = ProcessSpec::new(artifact).current_dir(&self.fixtures_dir);
        if let Some(detector) = &self.leak_detector {
            spec = spec.wrapped_in(detector);
        }
        let leak_code = self.leak_detector.as_ref().map(|d| d.error_exit_code);
        let outcome = match spec.run() {
            Ok(output) => ExecutionOutcome::from_output(output, leak_code, self.expected_total),
            Err(err) => ExecutionOutcome::launch_failure(spec.display(), &err),
        };
        tracing::debug!(classification = %outcome.classification, "verification finished");
        outcome
    }

    /// Run `artifact` in dump mode over `input` without the leak detector, feeding `stdin` when given.
    pub fn run_dump(&self, artifact: &Path, input: &str, stdin: Option<&[u8]>) -> ExecutionOutcome {
        let mut spec = ProcessSpec::new(artifact).arg(input).current_dir(&self.fixtures_dir);
        if let Some(bytes) = stdin {
            spec = spec.stdin(bytes);
        }
        match spec.run() {
            Ok(output) => ExecutionOutcome::from_output(output, None, None),
            Err(err) => ExecutionOutcome::launch_failure(spec.display(), &err),
        }
    }
}
