#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # svgforge
//!
//! Raster-to-SVG conversion built around two external tracers: `potrace` for
//! black-and-white line art and `vtracer` for full color. A source image can
//! optionally have its background removed first through `rembg`.
//!
//! ## Features
//!
//! - **Two modes**: black/white (binarize then `potrace`) and color (`vtracer`)
//! - **Slider mapping**: UI-friendly sliders translated into each tool's native parameters
//! - **Background removal**: external segmenter with a graceful fallback
//! - **Tidy storage**: per-request intermediates removed on every path, old files swept periodically
//! - **HTTP service**: upload, reprocess and file-serving endpoints (enable with `server`)
//! - **CLI**: `serve`, `convert` and `sweep` subcommands (enable with `cli`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svgforge::{ConversionPipeline, ProcessingMode, ProcessingRequest, ServiceConfig};
//!
//! # fn example() -> svgforge::Result<()> {
//! let config = ServiceConfig::builder().storage_root("/tmp/svgforge").build()?;
//! let pipeline = ConversionPipeline::new(&config)?;
//!
//! let request = ProcessingRequest::new(ProcessingMode::Color)
//!     .with_colors(16)
//!     .with_detail(7);
//! let artifact = pipeline.convert_file("logo.png", &request)?;
//! println!("wrote {}", artifact.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `server` (default): axum HTTP front end
//! - `cli` (default): command-line interface and tracing subscriber setup
//! - `webp-support` (default): WebP uploads
//! - `tracing-json`, `tracing-files`: extra log outputs for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! svgforge = { version = "0.1", default-features = false }
//! ```

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod params;
pub mod preprocessing;
pub mod processor;
pub mod segmentation;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

pub use backends::{BackendRegistry, ToolError, VectorizeJob, VectorizerBackend};
pub use config::{ServiceConfig, ServiceConfigBuilder, ServerConfig, StorageConfig, ToolsConfig};
pub use dispatcher::VectorizationDispatcher;
pub use error::{Result, VectorizeError};
pub use params::{MattingParams, ToolParams};
pub use preprocessing::ImagePreparer;
pub use processor::ConversionPipeline;
pub use segmentation::{BackgroundRemover, RembgSegmenter, Segmenter};
pub use services::{CleanupReport, Janitor, StorageLayout};
pub use types::{
    BackendKind, ProcessingMode, ProcessingRequest, RunNaming, SourceImage, VectorArtifact,
};
