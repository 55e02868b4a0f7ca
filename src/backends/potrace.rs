//! potrace backend for black/white tracing
//!
//! potrace only understands bilevel bitmaps, so the prepared RGB image is
//! binarized into a temporary BMP first. Black pixels are traced as
//! foreground.

use super::{ensure_output, ToolCommand, ToolError, VectorizeJob, VectorizerBackend};
use crate::params::bw_cut_value;
use crate::services::ImageIOService;
use crate::types::BackendKind;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::path::PathBuf;
use tempfile::TempPath;
use tracing::{debug, instrument};

const TOOL: &str = "potrace";

/// Backend invoking `potrace <bitmap> -s -o <svg>`
#[derive(Debug, Clone)]
pub struct PotraceBackend {
    command: Vec<String>,
}

impl PotraceBackend {
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for PotraceBackend {
    fn default() -> Self {
        Self::new(vec![TOOL.to_string()])
    }
}

/// Luma with ITU-R 601-2 weights, rounded
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// Binarize at a threshold given in percent
///
/// Pixels strictly brighter than the cut value become white (background),
/// everything else black (foreground).
#[must_use]
pub fn binarize(image: &DynamicImage, threshold_percent: u8) -> GrayImage {
    let cut = bw_cut_value(threshold_percent);
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        if luma(r, g, b) > cut {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

impl VectorizerBackend for PotraceBackend {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Potrace
    }

    #[instrument(skip(self, job), fields(run = %job.naming.run_id))]
    fn run(&self, job: &VectorizeJob<'_>) -> Result<PathBuf, ToolError> {
        let bitmap = TempPath::try_from_path(job.scratch_dir.join(job.naming.bitmap_file_name()))
            .map_err(|e| ToolError::input(TOOL, e))?;

        let prepared =
            ImageIOService::load_image(job.input).map_err(|e| ToolError::input(TOOL, e))?;
        let binary = binarize(&prepared, job.params.bw_threshold);
        drop(prepared);
        debug!(
            threshold = job.params.bw_threshold,
            cut = bw_cut_value(job.params.bw_threshold),
            bitmap = %bitmap.display(),
            "Writing binarized bitmap"
        );
        ImageIOService::save_with_format(
            &DynamicImage::ImageLuma8(binary),
            &bitmap,
            ImageFormat::Bmp,
        )
        .map_err(|e| ToolError::input(TOOL, e))?;

        ToolCommand::from_slice(TOOL, &self.command)
            .arg(bitmap.as_os_str())
            .arg("-s")
            .arg("-o")
            .arg(job.output)
            .run()?;

        ensure_output(TOOL, job.output)
    }
}
