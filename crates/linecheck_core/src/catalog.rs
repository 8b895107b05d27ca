//! Fixture catalog and expected line sequences.
//!
//! The deterministic fixtures are literal files; the checks below are the exact sequence of `get_next_line` calls
//! the verification program performs against them. `assets/line_tester.c` hardcodes the same sequence, and the
//! harness guardrail tests keep the two in sync.
//!
//! ## Notes
//!
//! - An `expected` of `None` is the end-of-stream sentinel (`NULL`). It never equals an empty string.
//! - Stress fixtures are generated per index, so they are described by functions instead of constants.

use crate::variant::Variant;

/// A deterministic fixture: fixed name, fixed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSpec {
    pub name: &'static str,
    pub content: &'static str,
}

pub const TEST1: FixtureSpec = FixtureSpec {
    name: "test1.txt",
    content: "Hello\nWorld\n",
};

pub const TEST2: FixtureSpec = FixtureSpec {
    name: "test2.txt",
    content: "LastLine",
};

pub const EMPTY: FixtureSpec = FixtureSpec {
    name: "empty.txt",
    content: "",
};

pub const SMALL: FixtureSpec = FixtureSpec {
    name: "small.txt",
    content: "ABC\n",
};

pub const MULTI1: FixtureSpec = FixtureSpec {
    name: "multi1.txt",
    content: "111\n222\n",
};

pub const MULTI2: FixtureSpec = FixtureSpec {
    name: "multi2.txt",
    content: "AAA\nBBB\n",
};

/// Every deterministic fixture, in generation order.
pub const DETERMINISTIC_FIXTURES: &[FixtureSpec] = &[TEST1, TEST2, EMPTY, SMALL, MULTI1, MULTI2];

/// Single line of `HUGE_LINE_LEN` repeated `HUGE_LINE_CHAR`, newline-terminated.
pub const HUGE_LINE_FILE: &str = "huge_line.txt";
pub const HUGE_LINE_LEN: usize = 1_000_000;
pub const HUGE_LINE_CHAR: u8 = b'A';

/// `HUGE_FILE_LINES` sequentially numbered lines (`Line0\n`, `Line1\n`, ...).
pub const HUGE_FILE: &str = "huge_file.txt";
pub const HUGE_FILE_LINES: usize = 100_000;

/// Pseudo-random bytes with no line structure.
pub const BINARY_FILE: &str = "binary.bin";
pub const BINARY_LEN: usize = 1024;

/// Randomized printable segments, each newline-terminated with probability 1/2.
pub const FUZZ_FILE: &str = "fuzz.txt";
pub const FUZZ_SEGMENTS: usize = 5000;
pub const FUZZ_MIN_SEGMENT: usize = 1;
pub const FUZZ_MAX_SEGMENT: usize = 200;

/// The printable character set fuzz segments are drawn from: digits, ASCII letters, punctuation and whitespace.
pub const PRINTABLE: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ \t\n\r\x0b\x0c";

/// Payload piped through standard input by the hardcore suite.
pub const STDIN_PAYLOAD: &str = "Line1\nLine2\n";

/// Descriptors opened concurrently by the multi-variant stress when not overridden.
pub const DEFAULT_STRESS_DESCRIPTORS: usize = 30;

/// Buffer sizes compiled when the operator does not pass `--buffers`.
pub const DEFAULT_BUFFER_SIZES: &[u64] = &[1, 2, 42, 1024, 10000];

/// Content of line `index` of the huge file.
pub fn huge_file_line(index: usize) -> String {
    format!("Line{index}\n")
}

/// File name of stress fixture `index`.
pub fn stress_file_name(index: usize) -> String {
    format!("stress{index}.txt")
}

/// The two lines of stress fixture `index`, in order.
pub fn stress_lines(index: usize) -> [String; 2] {
    [format!("Stress{index}\n"), format!("OK{index}\n")]
}

/// Full content of stress fixture `index`.
pub fn stress_content(index: usize) -> String {
    let [first, second] = stress_lines(index);
    first + &second
}

/// One `get_next_line` call and its expected result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    /// Label printed after the `[OK]` / `[FAIL]` marker.
    pub label: &'static str,
    /// Fixture the call reads from.
    pub fixture: &'static str,
    /// Expected line, or `None` for end-of-stream.
    pub expected: Option<&'static str>,
}

const fn check(label: &'static str, fixture: &'static str, expected: Option<&'static str>) -> Check {
    Check {
        label,
        fixture,
        expected,
    }
}

/// Checks compiled into every verification program.
pub const MANDATORY_CHECKS: &[Check] = &[
    check("test1: line1", TEST1.name, Some("Hello\n")),
    check("test1: line2", TEST1.name, Some("World\n")),
    check("test1: EOF", TEST1.name, None),
    check("test2: no final newline", TEST2.name, Some("LastLine")),
    check("test2: EOF", TEST2.name, None),
    check("empty: EOF", EMPTY.name, None),
    check("small: line", SMALL.name, Some("ABC\n")),
    check("small: EOF", SMALL.name, None),
];

/// Interleaved two-descriptor checks compiled into the multi variant, in call order.
///
/// The first block alternates `fd1,fd2,fd1,fd2`; the second reopens both files and reads `fd1,fd1,fd2,fd2`.
pub const BONUS_CHECKS: &[Check] = &[
    check("interleave fd1 line1", MULTI1.name, Some("111\n")),
    check("interleave fd2 line1", MULTI2.name, Some("AAA\n")),
    check("interleave fd1 line2", MULTI1.name, Some("222\n")),
    check("interleave fd2 line2", MULTI2.name, Some("BBB\n")),
    check("interleave fd1 EOF", MULTI1.name, None),
    check("interleave fd2 EOF", MULTI2.name, None),
    check("grouped fd1 line1", MULTI1.name, Some("111\n")),
    check("grouped fd1 line2", MULTI1.name, Some("222\n")),
    check("grouped fd2 line1", MULTI2.name, Some("AAA\n")),
    check("grouped fd2 line2", MULTI2.name, Some("BBB\n")),
    check("grouped fd1 EOF", MULTI1.name, None),
    check("grouped fd2 EOF", MULTI2.name, None),
];

/// Checks the round-robin stress performs per descriptor: two lines, then end-of-stream.
pub const STRESS_CHECKS_PER_DESCRIPTOR: usize = 3;

/// Number of checks a verification program compiled for `variant` reports in its score line.
pub fn expected_total(variant: Variant, stress_descriptors: usize) -> usize {
    match variant {
        Variant::Single => MANDATORY_CHECKS.len(),
        Variant::Multi => {
            MANDATORY_CHECKS.len() + BONUS_CHECKS.len() + stress_descriptors * STRESS_CHECKS_PER_DESCRIPTOR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_has_one_hundred_distinct_chars() {
        let mut seen = PRINTABLE.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(PRINTABLE.len(), 100);
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_checks_replay_fixture_contents() {
        // Replaying each fixture's checks in order must reconstruct its content exactly.
        for spec in [TEST1, TEST2, EMPTY, SMALL] {
            let lines: String = MANDATORY_CHECKS
                .iter()
                .filter(|c| c.fixture == spec.name)
                .filter_map(|c| c.expected)
                .collect();
            assert_eq!(lines, spec.content, "{}", spec.name);
        }
    }

    #[test]
    fn test_every_fixture_sequence_ends_with_eof() {
        for spec in DETERMINISTIC_FIXTURES {
            let last = MANDATORY_CHECKS
                .iter()
                .chain(BONUS_CHECKS)
                .filter(|c| c.fixture == spec.name)
                .last()
                .expect("fixture is exercised");
            assert_eq!(last.expected, None, "{}", spec.name);
        }
    }

    #[test]
    fn test_expected_total_counts_stress_rounds() {
        assert_eq!(expected_total(Variant::Single, 30), 8);
        assert_eq!(expected_total(Variant::Multi, 0), 20);
        assert_eq!(expected_total(Variant::Multi, 30), 20 + 90);
    }

    #[test]
    fn test_stress_content_is_two_lines() {
        assert_eq!(stress_content(7), "Stress7\nOK7\n");
        assert_eq!(stress_file_name(12), "stress12.txt");
    }
}
