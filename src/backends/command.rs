//! External command execution for the vectorizer and segmenter tools
//!
//! Provides a small builder around `std::process::Command` that resolves the
//! executable up front, captures output and turns non-zero exits into
//! [`ToolError::Failed`] with the tool's own stdout/stderr attached.
//!
//! ```ignore
//! let output = ToolCommand::from_slice("vtracer", &["vtracer"])
//!     .args(["--input", "in.png", "--output", "out.svg"])
//!     .run()?;
//! ```

use super::ToolError;
use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::PathBuf,
    process::{Command, Output, Stdio},
};
use tracing::{debug, trace};

/// Command builder for one external tool invocation
#[derive(Debug, Default)]
pub struct ToolCommand {
    tool: String,
    program: OsString,
    args: Vec<OsString>,
    stdin_data: Option<Vec<u8>>,
}

impl ToolCommand {
    /// Create from a configured command line (program plus leading arguments)
    ///
    /// `tool` is the human-facing name used in errors, independent of how the
    /// program is actually launched.
    pub fn from_slice<S: AsRef<OsStr>>(tool: &str, cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            tool: tool.to_string(),
            program,
            args,
            stdin_data: None,
        }
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Pipe `data` to the process's stdin.
    #[must_use]
    pub fn stdin<D: Into<Vec<u8>>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.into());
        self
    }

    /// Command line as it would be typed, for logs
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Locate the executable on `PATH` (or check an explicit path)
    ///
    /// # Errors
    /// - [`ToolError::NotFound`] if no executable matches
    pub fn resolve_program(&self) -> Result<PathBuf, ToolError> {
        if self.program.is_empty() {
            return Err(ToolError::NotFound {
                tool: self.tool.clone(),
            });
        }
        which::which(&self.program).map_err(|e| {
            debug!(tool = %self.tool, error = %e, "Executable lookup failed");
            ToolError::NotFound {
                tool: self.tool.clone(),
            }
        })
    }

    /// Execute the command, blocking until it exits
    ///
    /// # Errors
    /// - [`ToolError::NotFound`] when the executable is missing
    /// - [`ToolError::Spawn`] when the process cannot be started or awaited
    /// - [`ToolError::Failed`] on a non-zero exit status
    pub fn run(self) -> Result<Output, ToolError> {
        let executable = self.resolve_program()?;
        debug!(tool = %self.tool, command = %self.display_command(), "Running external tool");

        let mut cmd = Command::new(&executable);
        cmd.args(&self.args)
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
            tool: self.tool.clone(),
            source,
        })?;

        // Feed stdin from a separate thread so a tool that streams output
        // before consuming all input cannot deadlock on full pipes.
        let writer = match (self.stdin_data, child.stdin.take()) {
            (Some(data), Some(mut stdin)) => Some(std::thread::spawn(move || {
                stdin.write_all(&data)
            })),
            _ => None,
        };

        let output = child.wait_with_output().map_err(|source| ToolError::Spawn {
            tool: self.tool.clone(),
            source,
        })?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {},
                // The tool may legitimately exit before reading everything;
                // its exit status decides success.
                Ok(Err(e)) => debug!(tool = %self.tool, error = %e, "Writing stdin failed"),
                Err(_) => debug!(tool = %self.tool, "Stdin writer thread panicked"),
            }
        }

        trace!(
            tool = %self.tool,
            status = ?output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "External tool finished"
        );

        if output.status.success() {
            Ok(output)
        } else {
            Err(ToolError::Failed {
                tool: self.tool,
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}
