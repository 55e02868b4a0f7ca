//! Flat file storage for uploads, outputs and intermediates
//!
//! File names are the only addressing mechanism: there is no index. Every name
//! that arrives from a client passes through [`StorageLayout::check_file_name`]
//! before it touches the filesystem.

use crate::config::StorageConfig;
use crate::error::{Result, VectorizeError};
use crate::types::SourceImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Upload extensions accepted by the service
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Which storage directory a served file comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredKind {
    Upload,
    Output,
}

/// Resolved storage directories
#[derive(Debug, Clone)]
pub struct StorageLayout {
    config: StorageConfig,
}

impl StorageLayout {
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.config.temp_dir
    }

    /// Create the three storage directories if they are missing
    ///
    /// # Errors
    /// - Insufficient permissions to create a directory
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in self.config.directories() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    VectorizeError::file_io_error("create storage directory", dir, &e)
                })?;
                log::info!("Created storage directory {}", dir.display());
            }
        }
        Ok(())
    }

    /// Lower-cased extension of `file_name` if it is in [`ALLOWED_EXTENSIONS`]
    #[must_use]
    pub fn allowed_extension(file_name: &str) -> Option<String> {
        let (_, ext) = file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    /// Whether a client-supplied name is safe to join onto a storage directory
    #[must_use]
    pub fn is_safe_file_name(name: &str) -> bool {
        !name.is_empty()
            && !name.contains("..")
            && !name.starts_with('/')
            && !name.contains(['/', '\\'])
    }

    /// Reject unsafe client-supplied names
    ///
    /// # Errors
    /// - `InvalidInput` with `message` when the name is unsafe
    pub fn check_file_name(name: &str, message: &str) -> Result<()> {
        if Self::is_safe_file_name(name) {
            Ok(())
        } else {
            log::warn!("Rejected unsafe file name {:?}", name);
            Err(VectorizeError::invalid_input(message))
        }
    }

    /// Persist uploaded bytes under a fresh identifier
    ///
    /// # Errors
    /// - `UnsupportedFormat` for extensions outside [`ALLOWED_EXTENSIONS`]
    /// - I/O errors writing the file
    pub fn store_upload(&self, original_name: &str, bytes: &[u8]) -> Result<SourceImage> {
        let ext = Self::allowed_extension(original_name)
            .ok_or_else(|| VectorizeError::unsupported_format("File type not allowed"))?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let path = self.config.upload_dir.join(&file_name);
        fs::write(&path, bytes)
            .map_err(|e| VectorizeError::file_io_error("store upload", &path, &e))?;

        log::info!(
            "Stored upload {:?} as {} ({} bytes)",
            original_name,
            file_name,
            bytes.len()
        );
        Ok(SourceImage::new(&file_name, path))
    }

    /// Look up a previously uploaded source for reprocessing
    ///
    /// # Errors
    /// - `InvalidInput` for unsafe names (nothing is touched on disk)
    /// - `NotFound` if the upload is gone
    pub fn resolve_source(&self, file_name: &str) -> Result<SourceImage> {
        Self::check_file_name(file_name, "Invalid input filename")?;

        let path = self.config.upload_dir.join(file_name);
        if !path.is_file() {
            return Err(VectorizeError::not_found("Original input file not found"));
        }
        Ok(SourceImage::new(file_name, path))
    }

    /// Path of a stored file that is about to be served
    ///
    /// # Errors
    /// - `InvalidInput` for unsafe names
    /// - `NotFound` if no such file exists
    pub fn resolve_stored(&self, kind: StoredKind, file_name: &str) -> Result<PathBuf> {
        Self::check_file_name(file_name, "Invalid filename")?;

        let dir = match kind {
            StoredKind::Upload => &self.config.upload_dir,
            StoredKind::Output => &self.config.output_dir,
        };
        let path = dir.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(VectorizeError::not_found("File not found"))
        }
    }
}
