//! linecheck version information.
//!
//! Exposed as a single constant so the CLI and the JSON report agree on the same value.

/// The linecheck version string, taken from Cargo metadata at compile time.
pub const LINECHECK_VERSION: &str = env!("CARGO_PKG_VERSION");
