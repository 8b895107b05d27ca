//! The embedded verification program.
//!
//! One fixed C source, parameterized at compile time. See `assets/line_tester.c` for the output format it prints,
//! and [`linecheck_core::markers`] for the parsers that read it back.

use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use linecheck_core::Variant;

use crate::errors::{HarnessError, HarnessResult};

/// Source of the verification program, embedded at compile time from assets/line_tester.c
pub const TEMPLATE_SOURCE: &str = include_str!("../assets/line_tester.c");

/// File name the template is written under in the build directory.
pub const TEMPLATE_FILE_NAME: &str = "line_tester.c";

/// Write the template into `build_dir`, creating the directory if needed.
pub fn write_template(build_dir: &Path) -> HarnessResult<PathBuf> {
    fs::create_dir_all(build_dir).map_err(|source| HarnessError::BuildDir {
        path: build_dir.to_path_buf(),
        source,
    })?;
    let path = build_dir.join(TEMPLATE_FILE_NAME);
    fs::write(&path, TEMPLATE_SOURCE).map_err(|source| HarnessError::Template {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "wrote verification program");
    Ok(path)
}

/// Preprocessor definitions selecting the variant, buffer size and stress width, as `-D` argument pairs.
pub fn compile_definitions(variant: Variant, buffer_size: NonZeroU64, stress_descriptors: usize) -> Vec<String> {
    let mut args = vec!["-D".to_string(), format!("BUFFER_SIZE={buffer_size}")];
    if variant.is_multi() {
        args.push("-D".to_string());
        args.push("BONUS=1".to_string());
        args.push("-D".to_string());
        args.push(format!("STRESS_FDS={stress_descriptors}"));
    }
    args
}
