//! Output-marker vocabulary shared with the verification program.
//!
//! The program prints one marker line per check, an indented expected/got pair after each failure, and a final score
//! line. In dump mode it prints a single summary line on stderr. The parsers here are the only place the harness
//! interprets that text.
//!
//! ```text
//! [OK]   test1: line1
//! [FAIL] test2: no final newline
//!        Expected: "LastLine"
//!        Got     : NULL
//! Score: 7 / 8
//! ```

/// Marker printed before the label of a passing check.
pub const OK_MARKER: &str = "[OK]";

/// Marker printed before the label of a failing check.
pub const FAIL_MARKER: &str = "[FAIL]";

/// Prefix of the expected value printed after a failing check.
pub const EXPECTED_PREFIX: &str = "Expected:";

/// Prefix of the actual value printed after a failing check.
pub const GOT_PREFIX: &str = "Got     :";

/// Spelling of the end-of-stream sentinel in failure blocks.
pub const NULL_SPELLING: &str = "NULL";

/// Prefix of the final score line.
pub const SCORE_PREFIX: &str = "Score:";

/// Prefix of the dump-mode summary line printed on stderr.
pub const SUMMARY_PREFIX: &str = "LINECHECK";

/// Checks passed versus checks performed in one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreTally {
    pub passed: u32,
    pub total: u32,
}

impl ScoreTally {
    pub fn new(passed: u32, total: u32) -> Self {
        Self { passed, total }
    }

    /// Every check performed passed.
    pub fn is_perfect(&self) -> bool {
        self.passed == self.total
    }

    /// Accumulate another run's tally.
    pub fn absorb(&mut self, other: ScoreTally) {
        self.passed = self.passed.saturating_add(other.passed);
        self.total = self.total.saturating_add(other.total);
    }

    /// Parse a single `Score: <passed> / <total>` line.
    pub fn parse_line(line: &str) -> Option<ScoreTally> {
        let rest = line.trim().strip_prefix(SCORE_PREFIX)?;
        let (passed, total) = rest.split_once('/')?;
        let passed = passed.trim().parse().ok()?;
        let total = total.trim().parse().ok()?;
        Some(ScoreTally { passed, total })
    }

    /// Find the last score line in a program's stdout.
    pub fn find(stdout: &str) -> Option<ScoreTally> {
        stdout.lines().rev().find_map(ScoreTally::parse_line)
    }
}

impl std::fmt::Display for ScoreTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.passed, self.total)
    }
}

/// A failing check with the mismatching pair, both in the program's escaped spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckFailure {
    pub label: String,
    /// Expected line, `None` for end-of-stream.
    pub expected: Option<String>,
    /// Returned line, `None` for end-of-stream.
    pub got: Option<String>,
}

/// Parse a value printed after `Expected:` / `Got     :`.
///
/// Quoted values keep their escapes (`\n`, `\t`, `\xHH`, ...); the bare `NULL` spelling is end-of-stream.
fn parse_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw == NULL_SPELLING {
        return None;
    }
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    Some(inner.to_string())
}

/// Collect every `[FAIL]` block from a program's stdout.
///
/// A block whose expected/got lines are missing (for example because the program crashed mid-check) is still
/// reported, with both values left as end-of-stream.
pub fn parse_failures(stdout: &str) -> Vec<CheckFailure> {
    let mut failures = Vec::new();
    let mut current: Option<CheckFailure> = None;

    for line in stdout.lines() {
        let trimmed = line.trim_start();
        if let Some(label) = trimmed.strip_prefix(FAIL_MARKER) {
            if let Some(done) = current.take() {
                failures.push(done);
            }
            current = Some(CheckFailure {
                label: label.trim().to_string(),
                expected: None,
                got: None,
            });
        } else if let Some(value) = trimmed.strip_prefix(EXPECTED_PREFIX) {
            if let Some(failure) = current.as_mut() {
                failure.expected = parse_value(value);
            }
        } else if let Some(value) = trimmed.strip_prefix(GOT_PREFIX) {
            if let Some(mut failure) = current.take() {
                failure.got = parse_value(value);
                failures.push(failure);
            }
        } else if let Some(done) = current.take() {
            failures.push(done);
        }
    }
    if let Some(done) = current {
        failures.push(done);
    }
    failures
}

/// Stats a dump-mode run reports about what the library returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DumpSummary {
    /// Non-NULL results returned before end-of-stream.
    pub lines: u64,
    /// Sum of the returned lines' lengths.
    pub bytes: u64,
    /// Length of the longest returned line.
    pub longest: u64,
}

impl DumpSummary {
    /// Parse a `LINECHECK lines=<n> bytes=<m> longest=<k>` line.
    pub fn parse_line(line: &str) -> Option<DumpSummary> {
        let rest = line.trim().strip_prefix(SUMMARY_PREFIX)?;
        let mut summary = DumpSummary::default();
        let mut seen = 0;
        for field in rest.split_whitespace() {
            let (key, value) = field.split_once('=')?;
            let value: u64 = value.parse().ok()?;
            match key {
                "lines" => summary.lines = value,
                "bytes" => summary.bytes = value,
                "longest" => summary.longest = value,
                _ => continue,
            }
            seen += 1;
        }
        (seen == 3).then_some(summary)
    }

    /// Find the last summary line in a program's stderr.
    pub fn find(stderr: &str) -> Option<DumpSummary> {
        stderr.lines().rev().find_map(DumpSummary::parse_line)
    }
}
