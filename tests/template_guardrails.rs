//! Guardrails keeping the embedded verification program in step with `linecheck_core`'s catalog and markers.

use std::fs;
use std::path::{Path, PathBuf};

use linecheck::template::TEMPLATE_SOURCE;
use linecheck_core::catalog::{self, BONUS_CHECKS, MANDATORY_CHECKS};
use linecheck_core::markers::{EXPECTED_PREFIX, FAIL_MARKER, GOT_PREFIX, OK_MARKER, SCORE_PREFIX, SUMMARY_PREFIX};
use linecheck_core::DETERMINISTIC_FIXTURES;

/// Spell `s` the way it appears inside a C string literal.
fn c_literal(s: &str) -> String {
    let mut out = String::from("\"");
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// The verification program hardcodes the same checks the catalog describes; keep them in sync.
#[test]
fn every_catalog_check_appears_in_the_template() {
    let mut missing = Vec::new();
    for check in MANDATORY_CHECKS.iter().chain(BONUS_CHECKS) {
        let expected = match check.expected {
            Some(line) => c_literal(line),
            None => "NULL".to_string(),
        };
        let call = format!("{expected}, {})", c_literal(check.label));
        if !TEMPLATE_SOURCE.contains(&call) {
            missing.push(call);
        }
    }
    assert!(missing.is_empty(), "template is missing checks:\n{}", missing.join("\n"));
}

#[test]
fn every_deterministic_fixture_is_opened_by_the_template() {
    for fixture in DETERMINISTIC_FIXTURES {
        assert!(
            TEMPLATE_SOURCE.contains(&format!("open_fixture({})", c_literal(fixture.name))),
            "{} is never opened",
            fixture.name
        );
    }
}

#[test]
fn stress_formats_match_the_catalog() {
    assert_eq!(catalog::stress_file_name(3), "stress3.txt");
    assert!(TEMPLATE_SOURCE.contains("\"stress%d.txt\""));
    let [first, second] = catalog::stress_lines(3);
    assert_eq!(first, "Stress3\n");
    assert_eq!(second, "OK3\n");
    assert!(TEMPLATE_SOURCE.contains("\"Stress%d\\n\""));
    assert!(TEMPLATE_SOURCE.contains("\"OK%d\\n\""));
}

#[test]
fn output_markers_match_the_parsers() {
    for marker in [OK_MARKER, FAIL_MARKER, EXPECTED_PREFIX, GOT_PREFIX, SCORE_PREFIX, SUMMARY_PREFIX] {
        assert!(TEMPLATE_SOURCE.contains(marker), "template never prints {marker:?}");
    }
    assert!(TEMPLATE_SOURCE.contains("Score: %d / %d"));
    assert!(TEMPLATE_SOURCE.contains("LINECHECK lines=%zu bytes=%zu longest=%zu"));
}

/// Output-marker parsing lives in `linecheck_core::markers`; nothing else should match on marker text.
#[test]
fn no_marker_parsing_outside_the_core_vocabulary() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut offenders = Vec::new();
    for dir in [root.join("src"), root.join("crates")] {
        scan_dir(&root, &dir, &mut offenders);
    }
    if !offenders.is_empty() {
        let mut msg = String::from("Found marker parsing outside linecheck_core::markers:\n\n");
        for (path, line_no, line) in offenders {
            msg.push_str(&format!(
                "- {}:{}: {}\n",
                path.strip_prefix(&root).unwrap_or(&path).display(),
                line_no,
                line.trim()
            ));
        }
        panic!("{msg}");
    }
}

fn scan_dir(root: &Path, dir: &Path, offenders: &mut Vec<(PathBuf, usize, String)>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(root, &path, offenders);
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().into_owned();
        if !rel.ends_with(".rs") || rel == "crates/linecheck_core/src/markers.rs" {
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else {
            continue;
        };
        for (idx, line) in contents.lines().enumerate() {
            if is_suspicious_line(line) {
                offenders.push((path.clone(), idx + 1, line.to_string()));
            }
        }
    }
}

fn is_suspicious_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        return false;
    }
    ["[OK]", "[FAIL]", "Score:", "LINECHECK "].iter().any(|marker| {
        line.contains(&format!("strip_prefix(\"{marker}"))
            || line.contains(&format!("starts_with(\"{marker}"))
            || line.contains(&format!("== \"{marker}"))
    })
}
