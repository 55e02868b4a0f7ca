//! Conversion pipeline
//!
//! This module provides the `ConversionPipeline` that ties storage, background
//! removal, preparation and vectorization together. Both the HTTP server and
//! the CLI go through it so a conversion behaves the same everywhere.

use crate::{
    backends::BackendRegistry,
    config::ServiceConfig,
    dispatcher::VectorizationDispatcher,
    error::{Result, VectorizeError},
    preprocessing::ImagePreparer,
    segmentation::BackgroundRemover,
    services::{ImageIOService, StorageLayout},
    types::{ProcessingRequest, RunNaming, SourceImage, VectorArtifact},
};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Upload-then-convert and reprocess workflows over one storage layout
pub struct ConversionPipeline {
    layout: StorageLayout,
    remover: BackgroundRemover,
    preparer: ImagePreparer,
    dispatcher: VectorizationDispatcher,
}

impl ConversionPipeline {
    /// Pipeline with the configured external tools
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Storage directories cannot be created
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Self::with_components(
            config,
            BackgroundRemover::from_tools(&config.tools),
            BackendRegistry::from_tools(&config.tools),
        )
    }

    /// Pipeline with injected segmenter and vectorizer backends
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Storage directories cannot be created
    pub fn with_components(
        config: &ServiceConfig,
        remover: BackgroundRemover,
        registry: BackendRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let layout = StorageLayout::new(config.storage.clone());
        layout.ensure_directories()?;

        Ok(Self {
            preparer: ImagePreparer::new(layout.temp_dir()),
            dispatcher: VectorizationDispatcher::new(
                registry,
                layout.output_dir(),
                layout.temp_dir(),
            ),
            layout,
            remover,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Persist uploaded bytes as a new source image
    ///
    /// # Errors
    /// - Disallowed extension
    /// - Write failures
    pub fn store_upload(&self, original_name: &str, bytes: &[u8]) -> Result<SourceImage> {
        self.layout.store_upload(original_name, bytes)
    }

    /// Look up an existing source by its stored file name
    ///
    /// # Errors
    /// - Unsafe file name
    /// - Source no longer exists
    pub fn resolve_source(&self, file_name: &str) -> Result<SourceImage> {
        self.layout.resolve_source(file_name)
    }

    /// Convert a source image into a fresh SVG in the output directory
    ///
    /// Every intermediate is gone by the time this returns, whether the
    /// conversion succeeded or not.
    ///
    /// # Errors
    /// - Source cannot be decoded
    /// - Preparation or vectorizer failures
    #[instrument(
        skip(self, source, request),
        fields(
            source = %source.file_name,
            mode = %request.mode,
            remove_bg = request.remove_background
        )
    )]
    pub fn convert(
        &self,
        source: &SourceImage,
        request: &ProcessingRequest,
    ) -> Result<VectorArtifact> {
        let start = Instant::now();
        let naming = RunNaming::fresh(&source.id);

        let mut image = ImageIOService::load_image(&source.path)?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Loaded source image"
        );

        if request.remove_background {
            image = self
                .remover
                .remove_background(&image, request.mode, request.threshold);
        }

        let prepared = self.preparer.prepare(&image, request.mode, &naming)?;
        drop(image);

        let artifact =
            self.dispatcher
                .vectorize(prepared, request.mode, request.tool_params(), &naming)?;

        info!(
            svg = %artifact.file_name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Conversion complete"
        );
        Ok(artifact)
    }

    /// Convert an arbitrary file on disk without storing it as an upload
    ///
    /// # Errors
    /// - `NotFound` if `input` is not a file
    /// - Any [`ConversionPipeline::convert`] failure
    pub fn convert_file<P: AsRef<Path>>(
        &self,
        input: P,
        request: &ProcessingRequest,
    ) -> Result<VectorArtifact> {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(VectorizeError::not_found(format!(
                "Input file not found: {}",
                input.display()
            )));
        }
        let file_name = input
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.starts_with('.'))
            .unwrap_or("input");

        let source = SourceImage::new(file_name, input.to_path_buf());
        self.convert(&source, request)
    }
}
