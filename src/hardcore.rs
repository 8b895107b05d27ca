//! Hardcore checks: scenarios that need process plumbing the verification program cannot do on its own.
//!
//! All of them run one artifact in dump mode, outside the leak detector, except the descriptor budget check which
//! only needs the fixtures.

use std::fs::File;
use std::path::Path;

use linecheck_core::Variant;
use linecheck_core::catalog::{BINARY_FILE, FUZZ_FILE, HUGE_FILE, HUGE_LINE_FILE, STDIN_PAYLOAD};
use linecheck_core::markers::DumpSummary;
use serde::Serialize;

use crate::config::RobustnessPolicy;
use crate::execution::{Classification, ExecutionHarness, ExecutionOutcome};
use crate::fixtures::{FixtureManifest, FixtureStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardcoreCheck {
    StdinPipe,
    HugeLine,
    HugeFile,
    Binary,
    Fuzz,
    DescriptorBudget,
}

impl HardcoreCheck {
    pub fn name(self) -> &'static str {
        match self {
            HardcoreCheck::StdinPipe => "stdin-pipe",
            HardcoreCheck::HugeLine => "huge-line",
            HardcoreCheck::HugeFile => "huge-file",
            HardcoreCheck::Binary => "binary",
            HardcoreCheck::Fuzz => "fuzz",
            HardcoreCheck::DescriptorBudget => "descriptor-budget",
        }
    }

    /// Binary and fuzz input have no specified result; only termination is looked at.
    pub fn is_robustness(self) -> bool {
        matches!(self, HardcoreCheck::Binary | HardcoreCheck::Fuzz)
    }
}

impl std::fmt::Display for HardcoreCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HardcoreOutcome {
    pub check: HardcoreCheck,
    pub classification: Classification,
    /// Whether this outcome counts toward the final score.
    pub scored: bool,
    pub detail: String,
    /// The dump-mode run, stdout truncated; `None` for checks that launch nothing.
    pub execution: Option<ExecutionOutcome>,
}

impl HardcoreOutcome {
    /// Scored and not passed.
    pub fn is_scored_failure(&self) -> bool {
        self.scored && !self.classification.is_pass()
    }
}

/// Classify a dump-mode run over a fixture with known statistics.
///
/// Only the line count and byte count are compared, unless `check_longest` is set.
pub fn classify_dump(
    outcome: &ExecutionOutcome,
    expected: FixtureStats,
    check_longest: bool,
) -> (Classification, String) {
    if !outcome.exited_cleanly() {
        return (Classification::Crash, format!("terminated abnormally ({})", outcome.termination()));
    }
    let Some(summary) = DumpSummary::find(&outcome.stderr) else {
        return (Classification::Fail, "no summary line on stderr".to_string());
    };
    let mut mismatches = Vec::new();
    if summary.lines != expected.lines {
        mismatches.push(format!("lines {} (expected {})", summary.lines, expected.lines));
    }
    if summary.bytes != expected.bytes {
        mismatches.push(format!("bytes {} (expected {})", summary.bytes, expected.bytes));
    }
    if check_longest && summary.longest != expected.longest_line {
        mismatches.push(format!("longest {} (expected {})", summary.longest, expected.longest_line));
    }
    if mismatches.is_empty() {
        (
            Classification::Pass,
            format!("{} lines, {} bytes, longest {}", summary.lines, summary.bytes, summary.longest),
        )
    } else {
        (Classification::Fail, mismatches.join(", "))
    }
}

/// Runs the hardcore checks against one artifact.
#[derive(Debug)]
pub struct HardcoreSuite<'a> {
    variant: Variant,
    robustness: RobustnessPolicy,
    manifest: &'a FixtureManifest,
    harness: ExecutionHarness,
}

impl<'a> HardcoreSuite<'a> {
    pub fn new(variant: Variant, robustness: RobustnessPolicy, manifest: &'a FixtureManifest) -> Self {
        Self {
            variant,
            robustness,
            manifest,
            harness: ExecutionHarness::new(&manifest.dir, None),
        }
    }

    /// Checks run for this suite's variant, in order.
    pub fn checks(&self) -> Vec<HardcoreCheck> {
        let mut checks = vec![
            HardcoreCheck::StdinPipe,
            HardcoreCheck::HugeLine,
            HardcoreCheck::HugeFile,
            HardcoreCheck::Binary,
            HardcoreCheck::Fuzz,
        ];
        if self.variant.is_multi() {
            checks.push(HardcoreCheck::DescriptorBudget);
        }
        checks
    }

    /// Whether `check` counts toward the score under this suite's robustness policy.
    pub fn is_scored(&self, check: HardcoreCheck) -> bool {
        !check.is_robustness() || self.robustness == RobustnessPolicy::Scored
    }

    /// Run a single check.
    #[tracing::instrument(skip_all, fields(check = %check))]
    pub fn run_check(&self, check: HardcoreCheck, artifact: &Path) -> HardcoreOutcome {
        let (classification, detail, execution) = match check {
            HardcoreCheck::StdinPipe => self.stdin_pipe(artifact),
            HardcoreCheck::HugeLine => self.dump_with_stats(artifact, HUGE_LINE_FILE, true),
            HardcoreCheck::HugeFile => self.dump_with_stats(artifact, HUGE_FILE, false),
            HardcoreCheck::Binary => self.terminates(artifact, BINARY_FILE),
            HardcoreCheck::Fuzz => self.fuzz(artifact),
            HardcoreCheck::DescriptorBudget => {
                let (classification, detail) = self.descriptor_budget();
                (classification, detail, None)
            }
        };
        tracing::debug!(classification = %classification, "hardcore check finished");
        HardcoreOutcome {
            check,
            classification,
            scored: self.is_scored(check),
            detail,
            execution: execution.map(ExecutionOutcome::truncated),
        }
    }

    fn stdin_pipe(&self, artifact: &Path) -> (Classification, String, Option<ExecutionOutcome>) {
        let outcome = self.harness.run_dump(artifact, "-", Some(STDIN_PAYLOAD.as_bytes()));
        let (classification, detail) = if !outcome.exited_cleanly() {
            (Classification::Crash, format!("terminated abnormally ({})", outcome.termination()))
        } else if outcome.stdout == STDIN_PAYLOAD {
            (Classification::Pass, "echoed both piped lines".to_string())
        } else {
            (
                Classification::Fail,
                format!("expected {:?}, got {:?}", STDIN_PAYLOAD, outcome.stdout),
            )
        };
        (classification, detail, Some(outcome))
    }

    fn dump_with_stats(
        &self,
        artifact: &Path,
        fixture: &str,
        check_longest: bool,
    ) -> (Classification, String, Option<ExecutionOutcome>) {
        let outcome = self.harness.run_dump(artifact, fixture, None);
        let (classification, detail) = match self.manifest.stats(fixture) {
            Some(expected) => classify_dump(&outcome, expected, check_longest),
            None => (Classification::Fail, format!("{fixture} was not generated")),
        };
        (classification, detail, Some(outcome))
    }

    fn terminates(&self, artifact: &Path, fixture: &str) -> (Classification, String, Option<ExecutionOutcome>) {
        let outcome = self.harness.run_dump(artifact, fixture, None);
        let (classification, detail) = if outcome.exited_cleanly() {
            (Classification::Pass, "terminated normally".to_string())
        } else {
            (Classification::Crash, format!("terminated abnormally ({})", outcome.termination()))
        };
        (classification, detail, Some(outcome))
    }

    fn fuzz(&self, artifact: &Path) -> (Classification, String, Option<ExecutionOutcome>) {
        let (classification, mut detail, outcome) = self.terminates(artifact, FUZZ_FILE);
        if let (Some(run), Some(expected)) = (outcome.as_ref(), self.manifest.stats(FUZZ_FILE)) {
            if classification.is_pass() {
                let (stats_verdict, stats_detail) = classify_dump(run, expected, true);
                if !stats_verdict.is_pass() {
                    detail = format!("{detail}; stats differ: {stats_detail}");
                }
            }
        }
        (classification, detail, outcome)
    }

    /// Open every stress fixture at once.
    fn descriptor_budget(&self) -> (Classification, String) {
        let mut open = Vec::with_capacity(self.manifest.stress_files.len());
        for path in &self.manifest.stress_files {
            match File::open(path) {
                Ok(file) => open.push(file),
                Err(err) => {
                    return (
                        Classification::Fail,
                        format!(
                            "could only open {} of {} descriptors: {}: {err}",
                            open.len(),
                            self.manifest.stress_files.len(),
                            path.display()
                        ),
                    );
                }
            }
        }
        (Classification::Pass, format!("{} descriptors open at once", open.len()))
    }

    /// Run every check for this variant against `artifact`, handing each outcome to `on_complete` as it finishes.
    #[tracing::instrument(skip_all, fields(artifact = %artifact.display()))]
    pub fn run(&self, artifact: &Path, mut on_complete: impl FnMut(&HardcoreOutcome)) -> Vec<HardcoreOutcome> {
        self.checks()
            .into_iter()
            .map(|check| {
                let outcome = self.run_check(check, artifact);
                on_complete(&outcome);
                outcome
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureStore;
    use tempfile::tempdir;

    fn dump_outcome(exit_code: Option<i32>, stderr: &str) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::launch_failure("dump".to_string(), &std::io::Error::other("x"));
        outcome.exit_code = exit_code;
        outcome.stderr = stderr.to_string();
        outcome
    }

    fn huge_line_stats() -> FixtureStats {
        FixtureStats {
            lines: 1,
            bytes: 1_000_001,
            longest_line: 1_000_001,
        }
    }

    #[test]
    fn test_classify_dump_pass() {
        let outcome = dump_outcome(Some(0), "LINECHECK lines=1 bytes=1000001 longest=1000001\n");
        let (classification, _) = classify_dump(&outcome, huge_line_stats(), true);
        assert_eq!(classification, Classification::Pass);
    }

    #[test]
    fn test_classify_dump_truncated_line() {
        let outcome = dump_outcome(Some(0), "LINECHECK lines=2 bytes=1000001 longest=999999\n");
        let (classification, detail) = classify_dump(&outcome, huge_line_stats(), true);
        assert_eq!(classification, Classification::Fail);
        assert!(detail.contains("lines 2 (expected 1)"));
        assert!(detail.contains("longest 999999"));
    }

    #[test]
    fn test_classify_dump_crash_and_missing_summary() {
        let (classification, _) = classify_dump(&dump_outcome(Some(139), ""), huge_line_stats(), true);
        assert_eq!(classification, Classification::Crash);
        let (classification, detail) = classify_dump(&dump_outcome(Some(0), ""), huge_line_stats(), true);
        assert_eq!(classification, Classification::Fail);
        assert!(detail.contains("no summary"));
    }

    #[test]
    fn test_checks_per_variant() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Multi, 2, Some(1)).unwrap();
        let single = HardcoreSuite::new(Variant::Single, RobustnessPolicy::Informational, &manifest);
        assert!(!single.checks().contains(&HardcoreCheck::DescriptorBudget));
        let multi = HardcoreSuite::new(Variant::Multi, RobustnessPolicy::Informational, &manifest);
        assert_eq!(multi.checks().last(), Some(&HardcoreCheck::DescriptorBudget));
    }

    #[test]
    fn test_robustness_policy_controls_scoring() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Single, 1, Some(1)).unwrap();
        let lenient = HardcoreSuite::new(Variant::Single, RobustnessPolicy::Informational, &manifest);
        assert!(!lenient.is_scored(HardcoreCheck::Binary));
        assert!(!lenient.is_scored(HardcoreCheck::Fuzz));
        assert!(lenient.is_scored(HardcoreCheck::HugeLine));
        let strict = HardcoreSuite::new(Variant::Single, RobustnessPolicy::Scored, &manifest);
        assert!(strict.is_scored(HardcoreCheck::Binary));
    }

    #[test]
    fn test_descriptor_budget_opens_stress_files() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Multi, 8, Some(1)).unwrap();
        let suite = HardcoreSuite::new(Variant::Multi, RobustnessPolicy::Informational, &manifest);
        let outcome = suite.run_check(HardcoreCheck::DescriptorBudget, Path::new("/unused"));
        assert_eq!(outcome.classification, Classification::Pass);
        assert!(outcome.execution.is_none());
        assert!(outcome.detail.starts_with("8 descriptors"));
    }

    #[test]
    fn test_missing_artifact_is_crash() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Single, 1, Some(1)).unwrap();
        let suite = HardcoreSuite::new(Variant::Single, RobustnessPolicy::Informational, &manifest);
        let mut seen = Vec::new();
        let outcomes = suite.run(Path::new("/nonexistent/line_tester"), |o| seen.push(o.check));
        assert_eq!(outcomes.len(), 5);
        assert_eq!(seen, suite.checks());
        assert!(outcomes.iter().all(|o| o.classification == Classification::Crash));
        assert!(outcomes.iter().filter(|o| o.is_scored_failure()).count() == 3);
    }
}
