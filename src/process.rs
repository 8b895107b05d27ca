//! Child process execution shared by every stage.
//!
//! Compiles, verification runs, hardcore checks and the leak-detector wrapper all go through [`ProcessSpec::run`]:
//! spawn, feed stdin from a scoped thread, collect stdout/stderr, wait. There is no timeout.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::LeakDetector;

/// A command line to launch, with its working directory and stdin payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    /// Bytes written to the child's stdin; stdin is `/dev/null` when `None`.
    pub stdin: Option<Vec<u8>>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    /// Run this command under `detector`: `<detector> <detector args> <program> <args>`.
    pub fn wrapped_in(self, detector: &LeakDetector) -> Self {
        let mut args: Vec<OsString> = detector.args.iter().map(OsString::from).collect();
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: OsString::from(&detector.program),
            args,
            current_dir: self.current_dir,
            stdin: self.stdin,
        }
    }

    /// Shell-like rendering for reports and logs.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| {
                let part = part.to_string_lossy();
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{part}'")
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn the command and wait for it.
    ///
    /// An `Err` means the process could not be launched (or its pipes failed); anything the process itself does,
    /// including dying from a signal, is reported in the [`ProcessOutput`].
    pub fn run(&self) -> io::Result<ProcessOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        tracing::debug!(command = %self.display(), "spawning child process");
        let started = Instant::now();
        let mut child = command.spawn()?;

        let stdin_pipe = child.stdin.take();
        let output = thread::scope(|scope| {
            if let (Some(mut pipe), Some(bytes)) = (stdin_pipe, self.stdin.as_deref()) {
                scope.spawn(move || {
                    // A child that exits without draining stdin closes the pipe; that is its business.
                    if let Err(err) = pipe.write_all(bytes) {
                        if err.kind() != io::ErrorKind::BrokenPipe {
                            tracing::debug!(error = %err, "failed to feed child stdin");
                        }
                    }
                });
            }
            child.wait_with_output()
        })?;
        let duration = started.elapsed();

        let exit = ExitState::from_status(output.status);
        tracing::debug!(command = %self.display(), exit = %exit, ?duration, "child process finished");
        Ok(ProcessOutput {
            command: self.display(),
            exit,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        })
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Code(i32),
    Signal(i32),
    /// Neither an exit code nor a signal was reported.
    Unknown,
}

impl ExitState {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitState::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitState::Signal(signal);
            }
        }
        ExitState::Unknown
    }

    pub fn code(self) -> Option<i32> {
        match self {
            ExitState::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn signal(self) -> Option<i32> {
        match self {
            ExitState::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn success(self) -> bool {
        self == ExitState::Code(0)
    }
}

impl std::fmt::Display for ExitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitState::Code(code) => write!(f, "exit code {code}"),
            ExitState::Signal(signal) => write!(f, "signal {signal}"),
            ExitState::Unknown => write!(f, "unknown termination"),
        }
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// The command as displayed by [`ProcessSpec::display`].
    pub command: String,
    pub exit: ExitState,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}
