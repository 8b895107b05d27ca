//! Layering guardrails to keep `linecheck_core` a pure vocabulary crate.
//!
//! The core crate is shared with the fuzz target and must stay free of IO and of the harness's runtime stack. These
//! tests scan its `Cargo.toml` and sources.

use std::fs;
use std::path::{Path, PathBuf};

#[test]
fn core_depends_only_on_optional_serde() {
    let manifest = include_str!("../crates/linecheck_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            if line == "[dependencies]" {
                in_dependencies = true;
                continue;
            }
            // Any new section after `[dependencies]` ends the scan window.
            if in_dependencies {
                break;
            }
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        let name = line_no_comment.split('=').next().unwrap_or("").trim();
        assert_eq!(name, "serde", "`{name}` must not appear in linecheck_core's [dependencies]");
        assert!(
            line_no_comment.contains("optional = true"),
            "serde must stay optional in linecheck_core"
        );
    }
}

#[test]
fn core_sources_do_no_io() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("crates/linecheck_core/src");
    let mut offenders = Vec::new();
    scan(&src, &mut offenders);
    assert!(offenders.is_empty(), "linecheck_core must not touch the filesystem or processes: {offenders:?}");
}

fn scan(dir: &Path, offenders: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan(&path, offenders);
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else {
            continue;
        };
        for (idx, line) in contents.lines().enumerate() {
            if ["std::fs", "std::process", "std::net"].iter().any(|m| line.contains(m)) {
                offenders.push(format!("{}:{}", path.display(), idx + 1));
            }
        }
    }
}

#[test]
fn root_does_not_pull_core_without_serde() {
    let manifest = include_str!("../Cargo.toml");
    let core_line = manifest
        .lines()
        .find(|l| l.trim_start().starts_with("linecheck_core"))
        .expect("root manifest depends on linecheck_core");
    assert!(core_line.contains("\"serde\""), "the run report serializes core types");
}
