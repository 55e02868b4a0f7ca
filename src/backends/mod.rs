//! Vectorizer backends wrapping external command-line tools
//!
//! This module provides the backends the dispatcher routes to:
//! - potrace backend (monochrome boundary tracing from a binary bitmap)
//! - vtracer backend (color spline tracing from an RGBA PNG)
//!
//! Both implement [`VectorizerBackend`]; the dispatcher only ever sees the
//! trait and looks implementations up in a [`BackendRegistry`].

pub mod command;
pub mod potrace;
pub mod vtracer;

use crate::config::ToolsConfig;
use crate::params::ToolParams;
use crate::types::{BackendKind, RunNaming};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use self::command::ToolCommand;
pub use self::potrace::PotraceBackend;
pub use self::vtracer::VtracerBackend;

/// Failures of an external tool invocation
#[derive(Error, Debug)]
pub enum ToolError {
    /// Executable is not on the search path
    #[error("{tool} command not found in PATH")]
    NotFound { tool: String },

    /// The process could not be started or awaited
    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully
    #[error("{}", describe_failure(.tool, .status, .stdout, .stderr))]
    Failed {
        tool: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The tool reported success but wrote nothing
    #[error("{tool} exited successfully but produced no output at {}", .path.display())]
    MissingOutput { tool: String, path: PathBuf },

    /// The tool's input could not be produced
    #[error("Failed to prepare {tool} input: {message}")]
    Input { tool: String, message: String },
}

impl ToolError {
    /// Create an input preparation error
    pub fn input<S: ToString>(tool: &str, message: S) -> Self {
        Self::Input {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    /// Name of the tool the error belongs to
    #[must_use]
    pub fn tool(&self) -> &str {
        match self {
            Self::NotFound { tool }
            | Self::Spawn { tool, .. }
            | Self::Failed { tool, .. }
            | Self::MissingOutput { tool, .. }
            | Self::Input { tool, .. } => tool,
        }
    }
}

fn describe_failure(tool: &str, status: &Option<i32>, stdout: &str, stderr: &str) -> String {
    let mut message = match *status {
        Some(code) => format!("{} failed with exit code {}.", tool, code),
        None => format!("{} was terminated by a signal.", tool),
    };
    if !stdout.trim().is_empty() {
        message.push_str("\nStdout:\n");
        message.push_str(stdout);
    }
    if !stderr.trim().is_empty() {
        message.push_str("\nStderr:\n");
        message.push_str(stderr);
    }
    message
}

/// Everything a backend needs for one conversion
#[derive(Debug, Clone, Copy)]
pub struct VectorizeJob<'a> {
    /// Prepared raster (owned and deleted by the dispatcher)
    pub input: &'a Path,
    /// Where the SVG must be written
    pub output: &'a Path,
    /// Directory for backend-specific intermediates
    pub scratch_dir: &'a Path,
    /// Naming of the current run, for intermediate file names
    pub naming: &'a RunNaming,
    pub params: ToolParams,
}

/// Trait for vectorizer backends
pub trait VectorizerBackend: Send + Sync {
    /// Tool name used in logs and errors
    fn name(&self) -> &'static str;

    /// Which mode profile entry this backend serves
    fn kind(&self) -> BackendKind;

    /// Convert `job.input` into an SVG at `job.output`
    ///
    /// Implementations must delete any intermediate they create before
    /// returning, on success and on failure.
    ///
    /// # Errors
    /// - Missing executable
    /// - Non-zero exit status
    /// - Intermediate preparation failures
    fn run(&self, job: &VectorizeJob<'_>) -> Result<PathBuf, ToolError>;
}

/// Succeed only if the tool actually wrote its output file
pub(crate) fn ensure_output(tool: &str, output: &Path) -> Result<PathBuf, ToolError> {
    if output.is_file() {
        Ok(output.to_path_buf())
    } else {
        Err(ToolError::MissingOutput {
            tool: tool.to_string(),
            path: output.to_path_buf(),
        })
    }
}

/// Backend registry keyed by the kind each mode profile names
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Box<dyn VectorizerBackend>>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the potrace and vtracer backends from `tools`
    #[must_use]
    pub fn from_tools(tools: &ToolsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PotraceBackend::new(tools.potrace.clone())));
        registry.register(Box::new(VtracerBackend::new(tools.vtracer.clone())));
        registry
    }

    /// Register a backend, replacing any previous one of the same kind
    pub fn register(&mut self, backend: Box<dyn VectorizerBackend>) {
        self.backends.insert(backend.kind(), backend);
    }

    #[must_use]
    pub fn get(&self, kind: BackendKind) -> Option<&dyn VectorizerBackend> {
        self.backends.get(&kind).map(|b| &**b)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
