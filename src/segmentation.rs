//! Background removal through an external segmentation tool
//!
//! Background removal is an optional enhancement: when the segmenter is
//! missing or fails, the pipeline logs it and continues with the original
//! image.

use crate::backends::ToolCommand;
use crate::config::ToolsConfig;
use crate::error::Result;
use crate::params::MattingParams;
use crate::services::ImageIOService;
use crate::types::{ProcessingMode, ThresholdRole};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

/// Trait for segmentation backends
///
/// Input and output are encoded PNG bytes; the output must carry the
/// foreground alpha mask.
pub trait Segmenter: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Cut the background out of `png`
    ///
    /// # Errors
    /// - Tool missing or failing
    fn segment(&self, png: &[u8], params: &MattingParams) -> Result<Vec<u8>>;
}

/// Segmenter backed by the `rembg` command-line tool
///
/// Runs `rembg i [-a -af F -ab B -ae E] - -`, streaming PNG through
/// stdin/stdout.
#[derive(Debug, Clone)]
pub struct RembgSegmenter {
    command: Vec<String>,
}

impl RembgSegmenter {
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// rembg `i` subcommand arguments for the given matting parameters
    #[must_use]
    pub fn cli_args(params: &MattingParams) -> Vec<String> {
        let mut args = vec!["i".to_string()];
        if params.alpha_matting {
            args.extend([
                "-a".to_string(),
                "-af".to_string(),
                params.foreground_threshold.to_string(),
                "-ab".to_string(),
                params.background_threshold.to_string(),
                "-ae".to_string(),
                params.erode_size.to_string(),
            ]);
        }
        args.extend(["-".to_string(), "-".to_string()]);
        args
    }
}

impl Default for RembgSegmenter {
    fn default() -> Self {
        Self::new(vec!["rembg".to_string()])
    }
}

impl Segmenter for RembgSegmenter {
    fn name(&self) -> &str {
        "rembg"
    }

    fn segment(&self, png: &[u8], params: &MattingParams) -> Result<Vec<u8>> {
        let output = ToolCommand::from_slice("rembg", &self.command)
            .args(Self::cli_args(params))
            .stdin(png)
            .run()?;
        Ok(output.stdout)
    }
}

/// Adapter turning the UI slider into matting parameters and never failing
pub struct BackgroundRemover {
    segmenter: Box<dyn Segmenter>,
}

impl BackgroundRemover {
    #[must_use]
    pub fn new(segmenter: Box<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Remover using the configured `rembg` command
    #[must_use]
    pub fn from_tools(tools: &ToolsConfig) -> Self {
        Self::new(Box::new(RembgSegmenter::new(tools.rembg.clone())))
    }

    /// Matting parameters for `mode`; the slider only counts where the mode
    /// assigns it the aggressiveness role
    #[must_use]
    pub fn matting_params(mode: ProcessingMode, slider: u8) -> MattingParams {
        match mode.profile().threshold_role {
            ThresholdRole::MattingAggressiveness => MattingParams::from_slider(slider),
            ThresholdRole::Binarization => MattingParams::DEFAULT,
        }
    }

    /// Strip the background, falling back to the untouched image on failure
    ///
    /// The result is always RGBA8.
    #[instrument(skip(self, image), fields(segmenter = self.segmenter.name()))]
    pub fn remove_background(
        &self,
        image: &DynamicImage,
        mode: ProcessingMode,
        slider: u8,
    ) -> DynamicImage {
        let params = Self::matting_params(mode, slider);
        debug!(
            foreground = params.foreground_threshold,
            background = params.background_threshold,
            erode = params.erode_size,
            "Matting parameters"
        );

        match self.try_remove(image, &params) {
            Ok(result) => {
                info!("Background removed");
                result
            },
            Err(e) => {
                warn!("Background removal failed: {}. Proceeding without background removal.", e);
                DynamicImage::ImageRgba8(image.to_rgba8())
            },
        }
    }

    fn try_remove(&self, image: &DynamicImage, params: &MattingParams) -> Result<DynamicImage> {
        let png = ImageIOService::encode_png(image)?;
        let segmented = self.segmenter.segment(&png, params)?;
        let decoded = ImageIOService::load_from_bytes(&segmented)?;
        Ok(DynamicImage::ImageRgba8(decoded.to_rgba8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorizeError;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::sync::{Arc, Mutex};

    /// Makes the left half transparent and records the parameters it saw
    struct HalfMask {
        seen: Arc<Mutex<Vec<MattingParams>>>,
    }

    impl Segmenter for HalfMask {
        fn name(&self) -> &str {
            "half-mask"
        }

        fn segment(&self, png: &[u8], params: &MattingParams) -> Result<Vec<u8>> {
            self.seen.lock().unwrap().push(*params);
            let mut img = ImageIOService::load_from_bytes(png)?.to_rgba8();
            let width = img.width();
            for (x, _, px) in img.enumerate_pixels_mut() {
                if x < width / 2 {
                    px.0[3] = 0;
                }
            }
            ImageIOService::encode_png(&DynamicImage::ImageRgba8(img))
        }
    }

    struct Broken;

    impl Segmenter for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn segment(&self, _png: &[u8], _params: &MattingParams) -> Result<Vec<u8>> {
            Err(VectorizeError::internal("model exploded"))
        }
    }

    struct Garbage;

    impl Segmenter for Garbage {
        fn name(&self) -> &str {
            "garbage"
        }

        fn segment(&self, _png: &[u8], _params: &MattingParams) -> Result<Vec<u8>> {
            Ok(b"definitely not a png".to_vec())
        }
    }

    fn rgb_source() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([200, 10, 10])))
    }

    #[test]
    fn test_color_mode_uses_slider_curve() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let remover = BackgroundRemover::new(Box::new(HalfMask { seen: seen.clone() }));

        let out = remover.remove_background(&rgb_source(), ProcessingMode::Color, 100);
        let out = out.as_rgba8().expect("rgba output");
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert_eq!(out.get_pixel(3, 0), &Rgba([200, 10, 10, 255]));

        let params = seen.lock().unwrap()[0];
        assert_eq!(params.foreground_threshold, 225);
        assert_eq!(params.background_threshold, 35);
    }

    #[test]
    fn test_bw_mode_uses_fixed_parameters() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let remover = BackgroundRemover::new(Box::new(HalfMask { seen: seen.clone() }));

        remover.remove_background(&rgb_source(), ProcessingMode::BlackWhite, 100);
        assert_eq!(seen.lock().unwrap()[0], MattingParams::DEFAULT);
    }

    #[test]
    fn test_failure_falls_back_to_rgba_original() {
        let remover = BackgroundRemover::new(Box::new(Broken));
        let out = remover.remove_background(&rgb_source(), ProcessingMode::Color, 20);
        let rgba = out.as_rgba8().expect("rgba fallback");
        assert!(rgba.pixels().all(|p| p == &Rgba([200, 10, 10, 255])));
    }

    #[test]
    fn test_undecodable_output_falls_back() {
        let remover = BackgroundRemover::new(Box::new(Garbage));
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let out = remover.remove_background(&source, ProcessingMode::Color, 0);
        assert_eq!(out.as_rgba8().unwrap().get_pixel(1, 1), &Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_missing_rembg_falls_back() {
        let remover = BackgroundRemover::new(Box::new(RembgSegmenter::new(vec![
            "svgforge-no-such-rembg".to_string(),
        ])));
        let out = remover.remove_background(&rgb_source(), ProcessingMode::Color, 50);
        assert!(out.as_rgba8().is_some());
    }

    /// Accepts only PNG payloads and marks every pixel with alpha 7
    struct PngOnly;

    impl Segmenter for PngOnly {
        fn name(&self) -> &str {
            "png-only"
        }

        fn segment(&self, png: &[u8], _params: &MattingParams) -> Result<Vec<u8>> {
            if png.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
                let mut img = ImageIOService::load_from_bytes(png)?.to_rgba8();
                for px in img.pixels_mut() {
                    px.0[3] = 7;
                }
                ImageIOService::encode_png(&DynamicImage::ImageRgba8(img))
            } else {
                Err(VectorizeError::invalid_input("segmenter expects PNG input"))
            }
        }
    }

    #[test]
    fn test_jpeg_source_is_reencoded_as_png() {
        let mut jpeg = Vec::new();
        rgb_source()
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();
        let decoded = ImageIOService::load_from_bytes(&jpeg).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let remover = BackgroundRemover::new(Box::new(HalfMask { seen: seen.clone() }));
        let out = remover.remove_background(&decoded, ProcessingMode::Color, 20);
        assert_eq!(seen.lock().unwrap().len(), 1);
        let rgba = out.as_rgba8().expect("rgba output");
        assert_eq!(rgba.get_pixel(0, 0).0[3], 0);

        let masked = BackgroundRemover::new(Box::new(PngOnly))
            .remove_background(&decoded, ProcessingMode::Color, 20);
        let rgba = masked.as_rgba8().expect("rgba output");
        assert!(rgba.pixels().all(|p| p.0[3] == 7));
        assert_eq!(rgba.dimensions(), (4, 2));
    }

    #[test]
    fn test_rembg_cli_args() {
        let args = RembgSegmenter::cli_args(&MattingParams::DEFAULT);
        assert_eq!(args, ["i", "-a", "-af", "235", "-ab", "15", "-ae", "1", "-", "-"]);

        let no_matting = MattingParams {
            alpha_matting: false,
            ..MattingParams::DEFAULT
        };
        assert_eq!(RembgSegmenter::cli_args(&no_matting), ["i", "-", "-"]);
    }
}
