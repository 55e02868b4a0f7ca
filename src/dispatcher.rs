//! Routing of prepared images to the vectorizer backend for their mode

use crate::backends::{BackendRegistry, VectorizeJob};
use crate::error::{Result, VectorizeError};
use crate::params::ToolParams;
use crate::types::{ProcessingMode, RunNaming, VectorArtifact};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempPath;
use tracing::{info, instrument};

/// Picks the backend named by the mode profile and runs it
pub struct VectorizationDispatcher {
    registry: BackendRegistry,
    output_dir: PathBuf,
    temp_dir: PathBuf,
}

impl VectorizationDispatcher {
    pub fn new<O: Into<PathBuf>, T: Into<PathBuf>>(
        registry: BackendRegistry,
        output_dir: O,
        temp_dir: T,
    ) -> Self {
        Self {
            registry,
            output_dir: output_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Vectorize a prepared raster into `<output_dir>/<stem>.svg`
    ///
    /// Takes ownership of `prepared`: the file is deleted whatever the
    /// outcome. On failure no partial SVG is left in the output directory.
    ///
    /// # Errors
    /// - `Internal` if no backend is registered for the mode
    /// - `Tool` for any backend failure
    #[instrument(
        skip(self, prepared, params),
        fields(mode = %mode, run = %naming.run_id)
    )]
    pub fn vectorize(
        &self,
        prepared: PathBuf,
        mode: ProcessingMode,
        params: ToolParams,
        naming: &RunNaming,
    ) -> Result<VectorArtifact> {
        let prepared = TempPath::try_from_path(&prepared)
            .map_err(|e| VectorizeError::file_io_error("resolve prepared image path", &prepared, &e))?;
        let kind = mode.profile().backend;
        let backend = self.registry.get(kind).ok_or_else(|| {
            VectorizeError::internal(format!("No vectorizer registered for {}", kind))
        })?;

        let file_name = naming.svg_file_name();
        let target = self.output_dir.join(&file_name);
        let output = TempPath::try_from_path(&target)
            .map_err(|e| VectorizeError::file_io_error("resolve output path", &target, &e))?;
        let job = VectorizeJob {
            input: &prepared,
            output: &output,
            scratch_dir: &self.temp_dir,
            naming,
            params,
        };

        let start = Instant::now();
        backend.run(&job)?;
        info!(
            backend = backend.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Vectorization finished"
        );

        let path = output
            .keep()
            .map_err(|e| VectorizeError::file_io_error("keep output", &target, &e.error))?;
        Ok(VectorArtifact { file_name, path })
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
