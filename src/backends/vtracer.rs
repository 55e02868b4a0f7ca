//! vtracer backend for color tracing

use super::{ensure_output, ToolCommand, ToolError, VectorizeJob, VectorizerBackend};
use crate::params::{color_precision, path_precision, ToolParams, FILTER_SPECKLE};
use crate::types::BackendKind;
use std::path::PathBuf;
use tracing::{debug, instrument};

const TOOL: &str = "vtracer";

/// Backend invoking the vtracer CLI in spline color mode on an RGBA PNG
#[derive(Debug, Clone)]
pub struct VtracerBackend {
    command: Vec<String>,
}

impl VtracerBackend {
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Native vtracer arguments for the given sliders (input/output excluded)
    #[must_use]
    pub fn tuning_args(params: &ToolParams) -> Vec<String> {
        vec![
            "--colormode".to_string(),
            "color".to_string(),
            "--color_precision".to_string(),
            color_precision(params.color_count).to_string(),
            "--filter_speckle".to_string(),
            FILTER_SPECKLE.to_string(),
            "--path_precision".to_string(),
            path_precision(params.detail_level).to_string(),
            "--mode".to_string(),
            "spline".to_string(),
        ]
    }
}

impl Default for VtracerBackend {
    fn default() -> Self {
        Self::new(vec![TOOL.to_string()])
    }
}

impl VectorizerBackend for VtracerBackend {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Vtracer
    }

    #[instrument(skip(self, job), fields(run = %job.naming.run_id))]
    fn run(&self, job: &VectorizeJob<'_>) -> Result<PathBuf, ToolError> {
        let tuning = Self::tuning_args(&job.params);
        debug!(
            colors = job.params.color_count,
            detail = job.params.detail_level,
            args = ?tuning,
            "Mapped vtracer parameters"
        );

        ToolCommand::from_slice(TOOL, &self.command)
            .arg("--input")
            .arg(job.input)
            .arg("--output")
            .arg(job.output)
            .args(&tuning)
            .run()?;

        ensure_output(TOOL, job.output)
    }
}
