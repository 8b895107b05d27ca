//! Build matrix: one compiled verification program per `(variant, buffer size)`.
//!
//! A configuration whose sources are missing is skipped; one that fails to compile is recorded with the compiler's
//! diagnostics. Neither stops the remaining configurations.

use std::fs;
use std::io;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use linecheck_core::Variant;
use serde::Serialize;

use crate::config::{self, HarnessConfig, WARNING_FLAGS};
use crate::errors::{HarnessError, HarnessResult};
use crate::process::ProcessSpec;
use crate::template;

/// One cell of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub variant: Variant,
    pub buffer_size: NonZeroU64,
    /// Flags placed before the preprocessor definitions, in order.
    pub compiler_flags: Vec<String>,
}

impl BuildConfiguration {
    /// `single/bs=42` style label for reports.
    pub fn label(&self) -> String {
        format!("{}/bs={}", self.variant, self.buffer_size)
    }

    pub fn artifact_name(&self) -> String {
        format!("line_tester_{}_bs{}", self.variant, self.buffer_size)
    }
}

/// Result of invoking the compiler for one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutcome {
    pub configuration: BuildConfiguration,
    pub command: String,
    pub success: bool,
    /// Path of the produced program; `Some` only on success.
    pub artifact: Option<PathBuf>,
    /// Compiler output on failure, or the launch error when the compiler could not be started.
    pub diagnostics: Option<String>,
}

/// What happened to one configuration in the build stage.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Required library files were absent; the compiler was never invoked.
    Skipped {
        configuration: BuildConfiguration,
        missing: Vec<PathBuf>,
    },
    Compiled(CompileOutcome),
}

impl BuildOutcome {
    pub fn configuration(&self) -> &BuildConfiguration {
        match self {
            BuildOutcome::Skipped { configuration, .. } => configuration,
            BuildOutcome::Compiled(outcome) => &outcome.configuration,
        }
    }

    /// The artifact, if this configuration compiled.
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            BuildOutcome::Compiled(outcome) if outcome.success => outcome.artifact.as_deref(),
            _ => None,
        }
    }
}

/// Compiles the verification program against the library under test.
#[derive(Debug, Clone)]
pub struct BuildMatrix {
    variant: Variant,
    buffer_sizes: Vec<NonZeroU64>,
    compiler: String,
    compiler_flags: Vec<String>,
    stress_descriptors: usize,
    project_dir: PathBuf,
    build_dir: PathBuf,
    template: PathBuf,
}

impl BuildMatrix {
    /// Set up the matrix for `config`, compiling `template` (already written into the build directory).
    ///
    /// Paths are made absolute here so artifacts can be run from the fixture directory.
    pub fn new(config: &HarnessConfig, template: &Path) -> HarnessResult<Self> {
        let build_dir = config::absolute(&config.build_dir()).map_err(|source| HarnessError::BuildDir {
            path: config.build_dir(),
            source,
        })?;
        let project_dir = config
            .absolute_project_dir()
            .map_err(|err| HarnessError::InvalidConfig(format!("cannot resolve project directory: {err}")))?;
        let template = config::absolute(template).map_err(|source| HarnessError::Template {
            path: template.to_path_buf(),
            source,
        })?;

        let mut compiler_flags: Vec<String> = WARNING_FLAGS.iter().map(|f| f.to_string()).collect();
        compiler_flags.extend(config.compiler.extra_flags.iter().cloned());
        if config.leak_detector.is_some() {
            compiler_flags.push("-g".to_string());
        }

        Ok(Self {
            variant: config.variant,
            buffer_sizes: config.buffer_sizes.clone(),
            compiler: config.compiler.program.clone(),
            compiler_flags,
            stress_descriptors: config.stress_descriptors,
            project_dir,
            build_dir,
            template,
        })
    }

    /// Every configuration, in request order.
    pub fn configurations(&self) -> Vec<BuildConfiguration> {
        self.buffer_sizes
            .iter()
            .map(|&buffer_size| BuildConfiguration {
                variant: self.variant,
                buffer_size,
                compiler_flags: self.compiler_flags.clone(),
            })
            .collect()
    }

    /// Required files of `variant` that are not present in the project directory.
    pub fn missing_sources(&self, variant: Variant) -> Vec<PathBuf> {
        variant
            .required_files()
            .map(|name| self.project_dir.join(name))
            .filter(|path| !path.is_file())
            .collect()
    }

    /// The compiler invocation for `configuration`.
    pub fn compile_command(&self, configuration: &BuildConfiguration) -> ProcessSpec {
        let variant = configuration.variant;
        ProcessSpec::new(&self.compiler)
            .args(configuration.compiler_flags.iter())
            .args(template::compile_definitions(
                variant,
                configuration.buffer_size,
                self.stress_descriptors,
            ))
            .arg("-I")
            .arg(&self.project_dir)
            .args(variant.sources().iter().map(|source| self.project_dir.join(source)))
            .arg(&self.template)
            .arg("-o")
            .arg(self.artifact_path(configuration))
    }

    pub fn artifact_path(&self, configuration: &BuildConfiguration) -> PathBuf {
        self.build_dir.join(configuration.artifact_name())
    }

    /// Compile one configuration.
    #[tracing::instrument(skip_all, fields(configuration = %configuration.label()))]
    pub fn build(&self, configuration: &BuildConfiguration) -> BuildOutcome {
        let missing = self.missing_sources(configuration.variant);
        if !missing.is_empty() {
            tracing::warn!(missing = missing.len(), "required sources missing, skipping configuration");
            return BuildOutcome::Skipped {
                configuration: configuration.clone(),
                missing,
            };
        }

        let artifact = self.artifact_path(configuration);
        if let Err(err) = fs::remove_file(&artifact) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::debug!(error = %err, "could not remove stale artifact");
            }
        }

        let command = self.compile_command(configuration);
        let outcome = match command.run() {
            Ok(output) if output.exit.success() && artifact.is_file() => CompileOutcome {
                configuration: configuration.clone(),
                command: output.command,
                success: true,
                artifact: Some(artifact),
                diagnostics: None,
            },
            Ok(output) => {
                let mut diagnostics = output.stderr;
                if !output.stdout.trim().is_empty() {
                    diagnostics.push_str(&output.stdout);
                }
                if diagnostics.trim().is_empty() {
                    diagnostics = format!("compiler finished with {}", output.exit);
                }
                CompileOutcome {
                    configuration: configuration.clone(),
                    command: output.command,
                    success: false,
                    artifact: None,
                    diagnostics: Some(diagnostics),
                }
            }
            Err(err) => CompileOutcome {
                configuration: configuration.clone(),
                command: command.display(),
                success: false,
                artifact: None,
                diagnostics: Some(format!("failed to launch `{}`: {err}", self.compiler)),
            },
        };
        tracing::debug!(success = outcome.success, "compile finished");
        BuildOutcome::Compiled(outcome)
    }
}
