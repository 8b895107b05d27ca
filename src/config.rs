//! Harness configuration.
//!
//! Built once from the command line and passed by reference to every stage; nothing mutates it after
//! [`HarnessConfig::validate`] succeeds.

use std::io;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use linecheck_core::{DEFAULT_BUFFER_SIZES, Variant, catalog::DEFAULT_STRESS_DESCRIPTORS};
use serde::Serialize;

use crate::errors::{HarnessError, HarnessResult};

/// Warning flags every configuration is compiled with.
pub const WARNING_FLAGS: &[&str] = &["-Wall", "-Wextra", "-Werror"];

/// Default directory for fixtures and build artifacts, relative to the invocation directory.
pub const DEFAULT_WORK_DIR: &str = ".linecheck";

/// Default C compiler.
pub const DEFAULT_COMPILER: &str = "cc";

/// Default leak detector program.
pub const DEFAULT_LEAK_DETECTOR: &str = "valgrind";

/// Exit code the leak detector is told to use when it finds an error.
pub const DEFAULT_LEAK_EXIT_CODE: i32 = 42;

/// How crashes on inputs with unspecified behavior (binary and fuzz) are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RobustnessPolicy {
    /// Reported, never scored.
    #[default]
    Informational,
    /// Counted as failures.
    Scored,
}

/// External leak detector wrapping verification runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakDetector {
    pub program: String,
    /// Arguments placed between the program and the wrapped command.
    pub args: Vec<String>,
    /// Exit code that means "leak or memory error found".
    pub error_exit_code: i32,
}

impl LeakDetector {
    /// `valgrind --leak-check=full --error-exitcode=<code>`.
    pub fn valgrind(error_exit_code: i32) -> Self {
        Self::new(DEFAULT_LEAK_DETECTOR, error_exit_code)
    }

    /// A valgrind-compatible detector under another program name.
    pub fn new(program: impl Into<String>, error_exit_code: i32) -> Self {
        Self {
            program: program.into(),
            args: vec![
                "--leak-check=full".to_string(),
                format!("--error-exitcode={error_exit_code}"),
            ],
            error_exit_code,
        }
    }

    /// Pin a program named by a relative path to the current directory.
    ///
    /// Verification runs start from the fixture directory, so `./tools/vg` must not be resolved there. Bare names are
    /// left for `PATH` lookup.
    pub fn resolved(&self) -> HarnessResult<Self> {
        if !self.program.contains(std::path::is_separator) {
            return Ok(self.clone());
        }
        let program = absolute(Path::new(&self.program)).map_err(|source| HarnessError::LeakDetectorUnavailable {
            program: self.program.clone(),
            source,
        })?;
        Ok(Self {
            program: program.to_string_lossy().into_owned(),
            ..self.clone()
        })
    }

    /// Check the detector can be launched at all.
    ///
    /// Only a spawn failure counts; whatever `--version` prints or returns is ignored.
    pub fn probe(&self) -> HarnessResult<()> {
        let result = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match result {
            Ok(_) => Ok(()),
            Err(source) => Err(HarnessError::LeakDetectorUnavailable {
                program: self.program.clone(),
                source,
            }),
        }
    }
}

/// The host C compiler and any extra flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerSpec {
    pub program: String,
    /// Placed after the warning flags, in the given order.
    pub extra_flags: Vec<String>,
}

impl Default for CompilerSpec {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMPILER.to_string(),
            extra_flags: Vec::new(),
        }
    }
}

/// Everything a harness run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessConfig {
    pub variant: Variant,
    /// Buffer sizes in request order.
    pub buffer_sizes: Vec<NonZeroU64>,
    /// `Some` when verification runs are wrapped by a leak detector.
    pub leak_detector: Option<LeakDetector>,
    /// Directory holding the library sources and headers.
    pub project_dir: PathBuf,
    /// Directory for fixtures and build artifacts.
    pub work_dir: PathBuf,
    pub compiler: CompilerSpec,
    /// Descriptors the multi variant opens at once.
    pub stress_descriptors: usize,
    pub robustness: RobustnessPolicy,
    pub run_hardcore: bool,
    /// Seed for the randomized fixtures; fresh entropy when `None`.
    pub seed: Option<u64>,
    /// Where to write the JSON run report, if anywhere.
    pub json_report: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Single,
            buffer_sizes: default_buffer_sizes(),
            leak_detector: None,
            project_dir: PathBuf::from("."),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            compiler: CompilerSpec::default(),
            stress_descriptors: DEFAULT_STRESS_DESCRIPTORS,
            robustness: RobustnessPolicy::default(),
            run_hardcore: true,
            seed: None,
            json_report: None,
        }
    }
}

fn default_buffer_sizes() -> Vec<NonZeroU64> {
    DEFAULT_BUFFER_SIZES.iter().filter_map(|&n| NonZeroU64::new(n)).collect()
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_buffer_sizes(mut self, sizes: Vec<NonZeroU64>) -> Self {
        self.buffer_sizes = sizes;
        self
    }

    pub fn with_leak_detector(mut self, detector: LeakDetector) -> Self {
        self.leak_detector = Some(detector);
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_compiler(mut self, compiler: CompilerSpec) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_stress_descriptors(mut self, count: usize) -> Self {
        self.stress_descriptors = count;
        self
    }

    pub fn with_robustness(mut self, policy: RobustnessPolicy) -> Self {
        self.robustness = policy;
        self
    }

    pub fn with_hardcore(mut self, enabled: bool) -> Self {
        self.run_hardcore = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_json_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_report = Some(path.into());
        self
    }

    /// Directory the fixtures are generated into.
    pub fn fixtures_dir(&self) -> PathBuf {
        self.work_dir.join("fixtures")
    }

    /// Directory the template and artifacts are written into.
    pub fn build_dir(&self) -> PathBuf {
        self.work_dir.join("build")
    }

    /// Project directory, made absolute so it survives the compiler running elsewhere.
    pub fn absolute_project_dir(&self) -> io::Result<PathBuf> {
        absolute(&self.project_dir)
    }

    /// Reject configurations no run could make sense of.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.buffer_sizes.is_empty() {
            return Err(HarnessError::InvalidConfig(
                "at least one buffer size is required".to_string(),
            ));
        }
        if self.stress_descriptors == 0 {
            return Err(HarnessError::InvalidConfig(
                "the stress descriptor count must be positive".to_string(),
            ));
        }
        if self.compiler.program.trim().is_empty() {
            return Err(HarnessError::InvalidConfig("the compiler program is empty".to_string()));
        }
        if let Some(detector) = &self.leak_detector {
            if detector.error_exit_code == 0 {
                return Err(HarnessError::InvalidConfig(
                    "the leak exit code must be nonzero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Make `path` absolute against the current directory without touching the filesystem.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.variant, Variant::Single);
        let sizes: Vec<u64> = config.buffer_sizes.iter().map(|n| n.get()).collect();
        assert_eq!(sizes, vec![1, 2, 42, 1024, 10000]);
        assert!(config.leak_detector.is_none());
        assert_eq!(config.stress_descriptors, 30);
        assert_eq!(config.robustness, RobustnessPolicy::Informational);
        assert!(config.run_hardcore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_leak_detector_relative_path_is_pinned() {
        let detector = LeakDetector::new("./tools/vg", 42).resolved().unwrap();
        let program = PathBuf::from(&detector.program);
        assert!(program.is_absolute());
        assert_eq!(program, std::env::current_dir().unwrap().join("./tools/vg"));
        assert_eq!(detector.args, vec!["--leak-check=full", "--error-exitcode=42"]);

        let bare = LeakDetector::valgrind(42).resolved().unwrap();
        assert_eq!(bare.program, "valgrind");
    }

    #[test]
    fn test_work_dir_layout() {
        let config = HarnessConfig::new().with_work_dir("/tmp/lc");
        assert_eq!(config.fixtures_dir(), PathBuf::from("/tmp/lc/fixtures"));
        assert_eq!(config.build_dir(), PathBuf::from("/tmp/lc/build"));
    }

    #[test]
    fn test_valgrind_arguments() {
        let detector = LeakDetector::valgrind(42);
        assert_eq!(detector.program, "valgrind");
        assert_eq!(detector.args, vec!["--leak-check=full", "--error-exitcode=42"]);
        assert_eq!(detector.error_exit_code, 42);
    }

    #[test]
    fn test_validate_rejects_empty_buffers() {
        let config = HarnessConfig::new().with_buffer_sizes(Vec::new());
        assert!(matches!(config.validate(), Err(HarnessError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_descriptors() {
        let config = HarnessConfig::new().with_stress_descriptors(0);
        assert!(matches!(config.validate(), Err(HarnessError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_leak_code() {
        let config = HarnessConfig::new().with_leak_detector(LeakDetector::valgrind(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probe_missing_detector() {
        let detector = LeakDetector::new("linecheck-definitely-not-installed", 42);
        assert!(matches!(
            detector.probe(),
            Err(HarnessError::LeakDetectorUnavailable { .. })
        ));
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        let path = Path::new("/usr/src");
        assert_eq!(absolute(path).unwrap(), PathBuf::from("/usr/src"));
        assert!(absolute(Path::new("relative")).unwrap().is_absolute());
    }
}
