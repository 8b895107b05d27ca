//! Result reporting.
//!
//! The runner drives a [`ResultReporter`] through the run's lifecycle and builds a [`RunReport`] alongside. The
//! console reporter is what operators read; the run report is what gets serialized.

use std::fs;
use std::path::{Path, PathBuf};

use linecheck_core::Variant;
use linecheck_core::markers::ScoreTally;
use serde::Serialize;

use crate::config::{HarnessConfig, RobustnessPolicy};
use crate::errors::{HarnessError, HarnessResult};
use crate::execution::{Classification, ExecutionOutcome};
use crate::fixtures::FixtureManifest;
use crate::hardcore::HardcoreOutcome;
use crate::matrix::{BuildConfiguration, BuildOutcome};
use crate::version::LINECHECK_VERSION;

/// Why a configuration did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Required library files were missing.
    ConfigurationError,
    CompileError,
    RuntimeCrash,
    LeakDetected,
    /// At least one check returned the wrong line.
    AssertionFailure,
}

impl IssueKind {
    pub fn describe(self) -> &'static str {
        match self {
            IssueKind::ConfigurationError => "configuration error",
            IssueKind::CompileError => "compile error",
            IssueKind::RuntimeCrash => "runtime crash",
            IssueKind::LeakDetected => "leak detected",
            IssueKind::AssertionFailure => "assertion failure",
        }
    }
}

/// One configuration's journey through build and execution.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationReport {
    pub label: String,
    pub build: BuildOutcome,
    /// `None` unless the configuration compiled.
    pub execution: Option<ExecutionOutcome>,
}

impl ConfigurationReport {
    pub fn new(build: BuildOutcome, execution: Option<ExecutionOutcome>) -> Self {
        Self {
            label: build.configuration().label(),
            build,
            execution,
        }
    }

    pub fn configuration(&self) -> &BuildConfiguration {
        self.build.configuration()
    }

    pub fn classification(&self) -> Option<Classification> {
        self.execution.as_ref().map(|e| e.classification)
    }

    pub fn is_pass(&self) -> bool {
        self.classification() == Some(Classification::Pass)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.build, BuildOutcome::Skipped { .. })
    }

    pub fn issue(&self) -> Option<IssueKind> {
        match (&self.build, self.classification()) {
            (BuildOutcome::Skipped { .. }, _) => Some(IssueKind::ConfigurationError),
            (_, None) => Some(IssueKind::CompileError),
            (_, Some(Classification::Pass)) => None,
            (_, Some(Classification::Fail)) => Some(IssueKind::AssertionFailure),
            (_, Some(Classification::Crash)) => Some(IssueKind::RuntimeCrash),
            (_, Some(Classification::Leak)) => Some(IssueKind::LeakDetected),
        }
    }
}

/// Aggregate counts over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    /// Configurations plus scored hardcore checks that passed.
    pub passed: usize,
    /// Configurations that were attempted plus scored hardcore checks.
    pub scored: usize,
    /// Hardcore outcomes that do not count toward the score.
    pub informational: usize,
    /// Configurations skipped for missing sources.
    pub skipped: usize,
    /// Individual verification checks across every configuration that produced a score line.
    pub checks: ScoreTally,
}

impl Summary {
    pub fn failed(&self) -> usize {
        self.scored - self.passed
    }
}

/// Everything observed in one run, in the order it happened.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: &'static str,
    pub variant: Variant,
    pub buffer_sizes: Vec<u64>,
    pub leak_check: bool,
    pub robustness: RobustnessPolicy,
    pub fixtures: Option<FixtureManifest>,
    pub configurations: Vec<ConfigurationReport>,
    pub hardcore: Vec<HardcoreOutcome>,
    /// Why the hardcore suite did not run, if it did not.
    pub hardcore_skipped: Option<String>,
    pub summary: Summary,
}

impl RunReport {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            version: LINECHECK_VERSION,
            variant: config.variant,
            buffer_sizes: config.buffer_sizes.iter().map(|n| n.get()).collect(),
            leak_check: config.leak_detector.is_some(),
            robustness: config.robustness,
            fixtures: None,
            configurations: Vec::new(),
            hardcore: Vec::new(),
            hardcore_skipped: None,
            summary: Summary::default(),
        }
    }

    pub fn push_configuration(&mut self, report: ConfigurationReport) {
        self.configurations.push(report);
        self.summary = self.compute_summary();
    }

    pub fn push_hardcore(&mut self, outcome: HardcoreOutcome) {
        self.hardcore.push(outcome);
        self.summary = self.compute_summary();
    }

    fn compute_summary(&self) -> Summary {
        let mut summary = Summary::default();
        for report in &self.configurations {
            if report.is_skipped() {
                summary.skipped += 1;
                continue;
            }
            summary.scored += 1;
            if report.is_pass() {
                summary.passed += 1;
            }
            if let Some(tally) = report.execution.as_ref().and_then(|e| e.tally) {
                summary.checks.absorb(tally);
            }
        }
        for outcome in &self.hardcore {
            if outcome.scored {
                summary.scored += 1;
                if outcome.classification.is_pass() {
                    summary.passed += 1;
                }
            } else {
                summary.informational += 1;
            }
        }
        summary
    }

    /// No scored failure and no skipped configuration.
    pub fn is_success(&self) -> bool {
        self.summary.failed() == 0 && self.summary.skipped == 0
    }

    /// Path of the artifact the hardcore suite should use: the last configuration that compiled.
    pub fn last_artifact(&self) -> Option<PathBuf> {
        self.configurations
            .iter()
            .rev()
            .find_map(|r| r.build.artifact().map(Path::to_path_buf))
    }

    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> HarnessResult<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| HarnessError::ReportWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| HarnessError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Lifecycle callbacks for a harness run.
pub trait ResultReporter {
    fn on_run_start(&mut self, _config: &HarnessConfig) {}

    fn on_fixtures_ready(&mut self, _manifest: &FixtureManifest) {}

    fn on_configuration_start(&mut self, _configuration: &BuildConfiguration) {}

    fn on_configuration_complete(&mut self, report: &ConfigurationReport);

    /// `artifact` is the program the suite runs against.
    fn on_hardcore_start(&mut self, _artifact: &Path) {}

    fn on_hardcore_skipped(&mut self, _reason: &str) {}

    fn on_hardcore_complete(&mut self, outcome: &HardcoreOutcome);

    /// Always called, even when every configuration failed.
    fn on_run_complete(&mut self, report: &RunReport);
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Line-oriented report on stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    pub color: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool, color: bool) -> Self {
        Self { verbose, color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn tag(&self, tag: &str) -> String {
        let code = match tag {
            "OK" => GREEN,
            "FAIL" => RED,
            "WARN" | "SKIP" => YELLOW,
            _ => CYAN,
        };
        self.paint(code, &format!("[{tag}]"))
    }

    /// The status block printed for a finished configuration, without the program's own output.
    pub fn render_configuration(&self, report: &ConfigurationReport) -> String {
        let label = &report.label;
        let mut out = String::new();
        match (&report.build, &report.execution) {
            (BuildOutcome::Skipped { missing, .. }, _) => {
                let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
                out.push_str(&format!(
                    "{} {label}: {}, missing {}\n",
                    self.tag("SKIP"),
                    IssueKind::ConfigurationError.describe(),
                    names.join(", ")
                ));
            }
            (BuildOutcome::Compiled(compile), None) => {
                out.push_str(&format!("{} {label}: {}\n", self.tag("FAIL"), IssueKind::CompileError.describe()));
                if let Some(diagnostics) = &compile.diagnostics {
                    for line in diagnostics.lines() {
                        out.push_str(&format!("    {line}\n"));
                    }
                }
            }
            (BuildOutcome::Compiled(_), Some(execution)) => {
                let score = execution
                    .tally
                    .map(|t| format!(" ({t})"))
                    .unwrap_or_default();
                match execution.classification {
                    Classification::Pass => {
                        out.push_str(&format!("{} {label}: PASS{score}\n", self.tag("OK")));
                    }
                    Classification::Fail => {
                        out.push_str(&format!("{} {label}: FAIL{score}\n", self.tag("FAIL")));
                        if execution.tally.is_none() {
                            out.push_str("    no score line in output\n");
                        }
                        for failure in &execution.failures {
                            out.push_str(&format!(
                                "    {}: expected {}, got {}\n",
                                failure.label,
                                quoted(failure.expected.as_deref()),
                                quoted(failure.got.as_deref())
                            ));
                        }
                    }
                    Classification::Crash | Classification::Leak => {
                        let what = if execution.classification == Classification::Leak {
                            "LEAK"
                        } else {
                            "CRASH"
                        };
                        out.push_str(&format!(
                            "{} {label}: {what} ({})\n",
                            self.tag("FAIL"),
                            execution.termination()
                        ));
                        for line in execution.stderr.lines() {
                            out.push_str(&format!("    {line}\n"));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn render_hardcore(&self, outcome: &HardcoreOutcome) -> String {
        let tag = match (outcome.classification.is_pass(), outcome.scored) {
            (true, _) => "OK",
            (false, true) => "FAIL",
            (false, false) => "WARN",
        };
        let mut line = format!(
            "{} hardcore {}: {} ({})",
            self.tag(tag),
            outcome.check,
            outcome.classification,
            outcome.detail
        );
        if !outcome.scored {
            line.push_str(" [informational]");
        }
        line.push('\n');
        line
    }

    pub fn render_summary(&self, report: &RunReport) -> String {
        let summary = &report.summary;
        let mut out = String::new();
        out.push_str(&self.paint(BOLD, "===== LINECHECK SUMMARY ====="));
        out.push('\n');
        out.push_str(&format!("Score: {} / {}\n", summary.passed, summary.scored));
        out.push_str(&format!("Checks: {}\n", summary.checks));
        let mut parts = Vec::new();
        if summary.failed() > 0 {
            parts.push(self.paint(RED, &format!("{} failed", summary.failed())));
        }
        if summary.skipped > 0 {
            parts.push(self.paint(YELLOW, &format!("{} skipped", summary.skipped)));
        }
        if summary.informational > 0 {
            parts.push(format!("{} informational", summary.informational));
        }
        if !parts.is_empty() {
            out.push_str(&parts.join(", "));
            out.push('\n');
        }
        let verdict = if report.is_success() {
            self.paint(GREEN, "ALL SCORED CHECKS PASSED")
        } else {
            self.paint(RED, "SOME CHECKS DID NOT PASS")
        };
        out.push_str(&verdict);
        out.push('\n');
        out
    }
}

fn quoted(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("\"{value}\""),
        None => "NULL".to_string(),
    }
}

impl ResultReporter for ConsoleReporter {
    fn on_run_start(&mut self, config: &HarnessConfig) {
        let sizes: Vec<String> = config.buffer_sizes.iter().map(|n| n.to_string()).collect();
        println!(
            "{} linecheck {LINECHECK_VERSION}: {} ({}), buffer sizes {}, leak check {}",
            self.tag("INFO"),
            config.variant.mode_name(),
            config.variant,
            sizes.join(","),
            if config.leak_detector.is_some() { "on" } else { "off" }
        );
    }

    fn on_fixtures_ready(&mut self, manifest: &FixtureManifest) {
        let seed = manifest.seed.map(|s| format!(", seed {s}")).unwrap_or_default();
        println!(
            "{} {} fixtures ready in {}{seed}",
            self.tag("INFO"),
            manifest.fixtures.len(),
            manifest.dir.display()
        );
    }

    fn on_configuration_start(&mut self, configuration: &BuildConfiguration) {
        if self.verbose {
            println!("{} building {}", self.tag("INFO"), configuration.label());
        }
    }

    fn on_configuration_complete(&mut self, report: &ConfigurationReport) {
        if self.verbose {
            if let BuildOutcome::Compiled(compile) = &report.build {
                println!("    $ {}", compile.command);
            }
        }
        if let Some(execution) = &report.execution {
            print!("{}", execution.stdout);
            if self.verbose && execution.classification == Classification::Fail && !execution.stderr.is_empty() {
                eprint!("{}", execution.stderr);
            }
        }
        print!("{}", self.render_configuration(report));
    }

    fn on_hardcore_start(&mut self, artifact: &Path) {
        println!("{} hardcore suite against {}", self.tag("INFO"), artifact.display());
    }

    fn on_hardcore_skipped(&mut self, reason: &str) {
        println!("{} hardcore suite: {reason}", self.tag("SKIP"));
    }

    fn on_hardcore_complete(&mut self, outcome: &HardcoreOutcome) {
        print!("{}", self.render_hardcore(outcome));
        if self.verbose {
            if let Some(execution) = &outcome.execution {
                println!("    $ {}", execution.command);
                for line in execution.stderr.lines() {
                    println!("    {line}");
                }
            }
        }
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        println!();
        print!("{}", self.render_summary(report));
    }
}
