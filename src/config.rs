//! Configuration types for the conversion service
//!
//! All directories, ages and tool commands live in one `ServiceConfig` that is
//! handed to each component when it is constructed.

use crate::error::{Result, VectorizeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default root under which the three storage directories are created
pub const DEFAULT_STORAGE_ROOT: &str = "processing";
/// Files older than this are reclaimed by the janitor
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;
/// How often the background janitor sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
/// Largest accepted request body
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Where uploads, outputs and intermediates live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persisted source images
    pub upload_dir: PathBuf,
    /// Generated SVG files
    pub output_dir: PathBuf,
    /// Per-request intermediates (prepared PNGs, bitmaps)
    pub temp_dir: PathBuf,
    /// Age in seconds after which stored files are deleted
    pub max_age_secs: u64,
}

impl StorageConfig {
    /// Layout with `input`, `output` and `temp` below `root`
    pub fn under_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            upload_dir: root.join("input"),
            output_dir: root.join("output"),
            temp_dir: root.join("temp"),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// All three directories, in sweep order
    #[must_use]
    pub fn directories(&self) -> [&Path; 3] {
        [
            self.upload_dir.as_path(),
            self.output_dir.as_path(),
            self.temp_dir.as_path(),
        ]
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::under_root(DEFAULT_STORAGE_ROOT)
    }
}

/// Command lines of the external tools
///
/// Each entry is program plus leading arguments, so wrappers such as
/// `["python3", "-m", "rembg"]` work without a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub potrace: Vec<String>,
    pub vtracer: Vec<String>,
    pub rembg: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            potrace: vec!["potrace".to_string()],
            vtracer: vec!["vtracer".to_string()],
            rembg: vec!["rembg".to_string()],
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:5000`
    pub bind: String,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Seconds between background janitor sweeps
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl ServiceConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Load a configuration from a JSON file; missing sections take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| VectorizeError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            VectorizeError::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    /// - Empty tool command lines
    /// - Zero sweep interval or upload limit
    /// - Storage directories that collide
    pub fn validate(&self) -> Result<()> {
        for (name, command) in [
            ("potrace", &self.tools.potrace),
            ("vtracer", &self.tools.vtracer),
            ("rembg", &self.tools.rembg),
        ] {
            if command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(VectorizeError::invalid_config(format!(
                    "{} command must not be empty",
                    name
                )));
            }
        }

        if self.server.sweep_interval_secs == 0 {
            return Err(VectorizeError::config_value_error(
                "sweep interval",
                self.server.sweep_interval_secs,
                "1 or more seconds",
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(VectorizeError::config_value_error(
                "upload limit",
                self.server.max_upload_bytes,
                "1 or more bytes",
            ));
        }

        let [upload, output, temp] = self.storage.directories();
        if upload == output || upload == temp || output == temp {
            return Err(VectorizeError::invalid_config(
                "upload, output and temp directories must be distinct",
            ));
        }

        Ok(())
    }
}

/// Builder for `ServiceConfig`
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration (e.g. one loaded from disk)
    #[must_use]
    pub fn from_config(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Place all three storage directories under `root`
    #[must_use]
    pub fn storage_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        let max_age_secs = self.config.storage.max_age_secs;
        self.config.storage = StorageConfig::under_root(root);
        self.config.storage.max_age_secs = max_age_secs;
        self
    }

    #[must_use]
    pub fn upload_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.storage.upload_dir = dir.into();
        self
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.storage.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.storage.temp_dir = dir.into();
        self
    }

    #[must_use]
    pub fn max_age_secs(mut self, secs: u64) -> Self {
        self.config.storage.max_age_secs = secs;
        self
    }

    #[must_use]
    pub fn potrace_command(mut self, command: Vec<String>) -> Self {
        self.config.tools.potrace = command;
        self
    }

    #[must_use]
    pub fn vtracer_command(mut self, command: Vec<String>) -> Self {
        self.config.tools.vtracer = command;
        self
    }

    #[must_use]
    pub fn rembg_command(mut self, command: Vec<String>) -> Self {
        self.config.tools.rembg = command;
        self
    }

    #[must_use]
    pub fn bind<S: Into<String>>(mut self, bind: S) -> Self {
        self.config.server.bind = bind.into();
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.server.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.config.server.sweep_interval_secs = secs;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Any failure reported by [`ServiceConfig::validate`]
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
