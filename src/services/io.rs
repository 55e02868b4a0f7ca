//! Image I/O operations service
//!
//! This module separates file I/O operations from business logic,
//! making the preparation and vectorization stages testable on their own.

use crate::error::{Result, VectorizeError};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// # Arguments
    /// * `path` - Path to the image file
    ///
    /// # Returns
    /// * `Ok(DynamicImage)` - Successfully loaded image
    /// * `Err(VectorizeError)` - Failed to load image
    ///
    /// # Examples
    /// ```rust,no_run
    /// use svgforge::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("input.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(VectorizeError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                // Uploads keep the client's extension, which may not match the content
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    VectorizeError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data)
                    .map_err(|content_err| VectorizeError::image_error("decode image", path_ref, &content_err))
            },
        }
    }

    /// Decode an image from raw bytes
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(VectorizeError::from)
    }

    /// Encode an image as PNG into memory
    ///
    /// PNG is lossless and carries an alpha channel, so any source format can
    /// round-trip through it without losing transparency.
    pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }

    /// Save an image as PNG, creating the parent directory if needed
    pub fn save_png<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        Self::save_with_format(image, path, ImageFormat::Png)
    }

    /// Save an image in an explicit format, creating the parent directory if needed
    pub fn save_with_format<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: ImageFormat,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VectorizeError::file_io_error("create output directory", parent, &e)
            })?;
        }

        image
            .save_with_format(path_ref, format)
            .map_err(|e| VectorizeError::image_error("save image", path_ref, &e))?;

        log::debug!("Saved {:?} image to {}", format, path_ref.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_png_roundtrip_preserves_alpha() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(1, 1, Rgba([10, 20, 30, 40]));
        let bytes = ImageIOService::encode_png(&DynamicImage::ImageRgba8(img)).unwrap();

        let decoded = ImageIOService::load_from_bytes(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1), &Rgba([10, 20, 30, 40]));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImageIOService::load_image("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("read image file"));
    }

    #[test]
    fn test_load_with_mismatched_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        let img = DynamicImage::new_rgb8(3, 2);
        std::fs::write(&path, ImageIOService::encode_png(&img).unwrap()).unwrap();

        let loaded = ImageIOService::load_image(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(ImageIOService::load_image(&path).is_err());
    }

    #[test]
    fn test_save_png_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        ImageIOService::save_png(&DynamicImage::new_rgba8(2, 2), &path).unwrap();
        assert!(path.exists());
    }
}
