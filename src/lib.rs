#![forbid(unsafe_code)]
//! linecheck: a conformance and stress harness for `get_next_line` style line readers.
//!
//! The harness takes a C implementation of "read the next line from a descriptor, or signal end-of-stream", compiles
//! it against an embedded verification program for every requested buffer size, runs each build (optionally under a
//! leak detector), and then drives the last good build through stress scenarios that need external process plumbing.
//!
//! ## Stages
//!
//! 1. [`fixtures`] writes every input file before anything is compiled.
//! 2. [`template`] writes the verification program source.
//! 3. [`matrix`] compiles one artifact per `(variant, buffer size)` configuration.
//! 4. [`execution`] runs and classifies each artifact.
//! 5. [`hardcore`] runs pipe, huge-input, binary, fuzz and descriptor-budget scenarios.
//! 6. [`report`] aggregates everything; [`runner`] sequences the stages.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **Failures of the library under test** are data, not errors: they become classified outcomes and never abort
//!   the run. Only fixture/template filesystem errors and an unusable leak detector abort.

pub mod cli;
pub mod config;
pub mod errors;
pub mod execution;
pub mod fixtures;
pub mod hardcore;
pub mod matrix;
pub mod process;
pub mod report;
pub mod runner;
pub mod template;
pub mod version;

pub use config::{CompilerSpec, HarnessConfig, LeakDetector, RobustnessPolicy};
pub use errors::{HarnessError, HarnessResult};
pub use execution::{Classification, ExecutionHarness, ExecutionOutcome};
pub use fixtures::{FixtureManifest, FixtureStore};
pub use hardcore::{HardcoreCheck, HardcoreOutcome, HardcoreSuite};
pub use matrix::{BuildConfiguration, BuildMatrix, BuildOutcome, CompileOutcome};
pub use report::{ConsoleReporter, ResultReporter, RunReport};
pub use runner::run_harness;

pub use linecheck_core::Variant;
