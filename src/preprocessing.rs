//! Mode-specific image normalization ahead of vectorization
//!
//! The two tracers disagree about their input: vtracer wants transparency
//! preserved, potrace wants a flat image it can binarize. Black/white
//! preparation therefore flattens transparency against white so transparent
//! pixels end up as background.

use crate::error::Result;
use crate::error::VectorizeError;
use crate::services::ImageIOService;
use crate::types::{Preparation, ProcessingMode, RunNaming};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::PathBuf;
use tempfile::TempPath;
use tracing::{debug, instrument};

/// Writes prepared intermediates into the temp directory
#[derive(Debug, Clone)]
pub struct ImagePreparer {
    temp_dir: PathBuf,
}

impl ImagePreparer {
    pub fn new<P: Into<PathBuf>>(temp_dir: P) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    /// Composite onto opaque white using the image's own alpha as mask
    #[must_use]
    pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
        let rgba = image.to_rgba8();
        RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let alpha = u32::from(a);
            let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            Rgb([blend(r), blend(g), blend(b)])
        })
    }

    /// Apply a preparation policy in memory
    #[must_use]
    pub fn normalize(image: &DynamicImage, preparation: Preparation) -> DynamicImage {
        match preparation {
            Preparation::Rgba => DynamicImage::ImageRgba8(image.to_rgba8()),
            Preparation::FlattenOnWhite => DynamicImage::ImageRgb8(Self::flatten_on_white(image)),
        }
    }

    /// Normalize `image` for `mode` and write it as PNG
    ///
    /// The returned path belongs to the caller, who must hand it to the
    /// dispatcher (which deletes it). A failed write leaves nothing behind.
    ///
    /// # Errors
    /// - PNG encoding or write failures
    #[instrument(skip(self, image), fields(mode = %mode, run = %naming.run_id))]
    pub fn prepare(
        &self,
        image: &DynamicImage,
        mode: ProcessingMode,
        naming: &RunNaming,
    ) -> Result<PathBuf> {
        let preparation = mode.profile().preparation;
        let target = self.temp_dir.join(naming.prepared_file_name());
        let guard = TempPath::try_from_path(&target)
            .map_err(|e| VectorizeError::file_io_error("resolve prepared image path", &target, &e))?;

        let normalized = Self::normalize(image, preparation);
        ImageIOService::save_png(&normalized, &guard)?;

        debug!(
            ?preparation,
            width = normalized.width(),
            height = normalized.height(),
            path = %guard.display(),
            "Prepared image"
        );
        guard
            .keep()
            .map_err(|e| VectorizeError::file_io_error("keep prepared image", &target, &e.error))
    }
}
