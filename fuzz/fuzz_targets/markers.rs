#![no_main]

use libfuzzer_sys::fuzz_target;
use linecheck_core::markers::{DumpSummary, ScoreTally, parse_failures};

fuzz_target!(|data: &[u8]| {
    // The harness decodes child output lossily, so do the same here
    let text = String::from_utf8_lossy(data);

    if let Some(tally) = ScoreTally::find(&text) {
        let _ = tally.is_perfect();
    }
    let failures = parse_failures(&text);
    let markers = text.lines().filter(|l| l.trim_start().starts_with("[FAIL]")).count();
    assert_eq!(failures.len(), markers);
    let _ = DumpSummary::find(&text);
});
