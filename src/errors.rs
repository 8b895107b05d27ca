//! Errors that abort a harness run.
//!
//! Everything the library under test does wrong is reported as a classified outcome instead (see
//! [`crate::report::IssueKind`]). The variants here cover the few conditions later stages cannot work around: the
//! fixtures or the verification program could not be written, the run configuration is unusable, or the final
//! report could not be saved.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("failed to write fixture `{}`", path.display())]
    #[diagnostic(
        code(linecheck::fixture_io),
        help("fixtures are generated under the work directory; check that it is writable")
    )]
    Fixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare build directory `{}`", path.display())]
    #[diagnostic(code(linecheck::build_dir))]
    BuildDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write verification program `{}`", path.display())]
    #[diagnostic(code(linecheck::template_io))]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("leak detector `{program}` could not be launched")]
    #[diagnostic(
        code(linecheck::leak_detector),
        help("install it, point --leak-detector at it, or run without --valgrind")
    )]
    LeakDetectorUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(linecheck::config))]
    InvalidConfig(String),

    #[error("failed to write report `{}`", path.display())]
    #[diagnostic(code(linecheck::report_io))]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode report")]
    #[diagnostic(code(linecheck::report_encode))]
    ReportEncode(#[from] serde_json::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
