//! External command execution.
//!
//! Commands always run with an explicit working directory and report their
//! exit status; nothing here changes the process-wide current directory.

use crate::error::ProcessError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Create an invocation of `program` inside `cwd`
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Human-readable command line, e.g. `git clone http://...`
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status as shown in error messages
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status: {}", code),
            None => "signal".to_string(),
        }
    }
}

impl From<(ExitStatus, Vec<u8>, Vec<u8>)> for CommandOutput {
    fn from((status, stdout, stderr): (ExitStatus, Vec<u8>, Vec<u8>)) -> Self {
        Self {
            code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }
}

/// Runs external commands to completion
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    envs: Vec<(OsString, OsString)>,
}

impl SystemRunner {
    /// Create a runner that inherits the parent environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an extra environment variable for every command
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(
            "Running `{}` in {}",
            invocation.command_line(),
            invocation.cwd.display()
        );

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|source| ProcessError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let output = CommandOutput::from((output.status, output.stdout, output.stderr));
        if !output.success() {
            tracing::warn!(
                "`{}` failed ({}): {}",
                invocation.command_line(),
                output.status_text(),
                output.stderr.trim()
            );
        }
        Ok(output)
    }
}
