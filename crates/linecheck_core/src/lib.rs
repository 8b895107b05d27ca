//! Provide the shared, pure vocabulary of the linecheck harness.
//!
//! The harness and the C verification program it compiles talk to each other through files and text: fixture names,
//! literal fixture contents, the expected line sequences, and the markers the program prints. Everything both sides
//! must agree on lives here so the Rust side has a single source of truth to check the template against.
//!
//! ## Notes
//!
//! - This is a "vocabulary core" crate: **no IO**, no global state, no process handling.
//! - Optional `serde` support exists so the harness can serialize tallies and failures into its JSON report.

pub mod catalog;
pub mod markers;
pub mod variant;

pub use catalog::{Check, DEFAULT_BUFFER_SIZES, DETERMINISTIC_FIXTURES, FixtureSpec};
pub use markers::{CheckFailure, DumpSummary, ScoreTally};
pub use variant::Variant;
