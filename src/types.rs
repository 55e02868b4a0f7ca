//! Core types flowing through the conversion pipeline

use crate::error::{Result, VectorizeError};
use crate::params::ToolParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lowest accepted color count slider value
pub const MIN_COLORS: u8 = 2;
/// Highest accepted color count slider value
pub const MAX_COLORS: u8 = 32;
/// Color count used when the caller sends nothing usable
pub const DEFAULT_COLORS: u8 = 8;
/// Lowest accepted detail slider value
pub const MIN_DETAIL: u8 = 1;
/// Highest accepted detail slider value
pub const MAX_DETAIL: u8 = 10;
/// Detail level used when the caller sends nothing usable
pub const DEFAULT_DETAIL: u8 = 5;
/// Upper bound of every percentage slider
pub const MAX_THRESHOLD: u8 = 100;
/// Binarization threshold used whenever the threshold slider drives something else
pub const DEFAULT_BW_THRESHOLD: u8 = 50;
/// Background-removal slider default in color mode
pub const DEFAULT_COLOR_THRESHOLD: u8 = 20;

/// Conversion mode selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProcessingMode {
    /// Monochrome tracing through potrace
    #[serde(rename = "bw")]
    BlackWhite,
    /// Multi-color tracing through vtracer
    #[serde(rename = "color")]
    #[default]
    Color,
}

/// How the source raster is normalized before vectorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    /// Keep transparency, four channels
    Rgba,
    /// Composite onto opaque white, three channels
    FlattenOnWhite,
}

/// External vectorizer a mode is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Potrace,
    Vtracer,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Potrace => write!(f, "potrace"),
            Self::Vtracer => write!(f, "vtracer"),
        }
    }
}

/// What the single threshold slider means for a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRole {
    /// Grayscale cut point for binarization
    Binarization,
    /// Background-removal aggressiveness
    MattingAggressiveness,
}

/// Everything that differs between modes, in one place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    pub preparation: Preparation,
    pub backend: BackendKind,
    pub threshold_role: ThresholdRole,
    pub default_threshold: u8,
}

impl ProcessingMode {
    /// Mode table: preparation policy, vectorizer backend and threshold role
    #[must_use]
    pub const fn profile(self) -> ModeProfile {
        match self {
            Self::BlackWhite => ModeProfile {
                preparation: Preparation::FlattenOnWhite,
                backend: BackendKind::Potrace,
                threshold_role: ThresholdRole::Binarization,
                default_threshold: DEFAULT_BW_THRESHOLD,
            },
            Self::Color => ModeProfile {
                preparation: Preparation::Rgba,
                backend: BackendKind::Vtracer,
                threshold_role: ThresholdRole::MattingAggressiveness,
                default_threshold: DEFAULT_COLOR_THRESHOLD,
            },
        }
    }
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlackWhite => write!(f, "bw"),
            Self::Color => write!(f, "color"),
        }
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = VectorizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bw" => Ok(Self::BlackWhite),
            "color" => Ok(Self::Color),
            other => Err(VectorizeError::invalid_input(format!(
                "Invalid mode '{}' (expected 'bw' or 'color')",
                other
            ))),
        }
    }
}

fn clamp_slider(value: i64, min: u8, max: u8) -> u8 {
    value.clamp(i64::from(min), i64::from(max)) as u8
}

/// Parameters of one conversion, already clamped into their slider ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingRequest {
    pub mode: ProcessingMode,
    pub color_count: u8,
    pub detail_level: u8,
    pub remove_background: bool,
    pub threshold: u8,
}

impl ProcessingRequest {
    /// Request with every slider at its default for `mode`
    #[must_use]
    pub fn new(mode: ProcessingMode) -> Self {
        Self {
            mode,
            color_count: DEFAULT_COLORS,
            detail_level: DEFAULT_DETAIL,
            remove_background: false,
            threshold: mode.profile().default_threshold,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colors: i64) -> Self {
        self.color_count = clamp_slider(colors, MIN_COLORS, MAX_COLORS);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: i64) -> Self {
        self.detail_level = clamp_slider(detail, MIN_DETAIL, MAX_DETAIL);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = clamp_slider(threshold, 0, MAX_THRESHOLD);
        self
    }

    #[must_use]
    pub fn with_background_removal(mut self, enabled: bool) -> Self {
        self.remove_background = enabled;
        self
    }

    /// Binarization cut point in percent; only black/white mode reads the slider
    #[must_use]
    pub fn bw_threshold(&self) -> u8 {
        match self.mode.profile().threshold_role {
            ThresholdRole::Binarization => self.threshold,
            ThresholdRole::MattingAggressiveness => DEFAULT_BW_THRESHOLD,
        }
    }

    /// Background-removal slider, if this mode maps it onto the matting curve
    #[must_use]
    pub fn matting_slider(&self) -> Option<u8> {
        match self.mode.profile().threshold_role {
            ThresholdRole::MattingAggressiveness => Some(self.threshold),
            ThresholdRole::Binarization => None,
        }
    }

    /// Slider values handed to the vectorizer backend
    #[must_use]
    pub fn tool_params(&self) -> ToolParams {
        ToolParams {
            color_count: self.color_count,
            detail_level: self.detail_level,
            bw_threshold: self.bw_threshold(),
        }
    }
}

impl Default for ProcessingRequest {
    fn default() -> Self {
        Self::new(ProcessingMode::default())
    }
}

/// An uploaded raster persisted in the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Stable identifier, the file name up to the first `.`
    pub id: String,
    /// Stored file name, `<id>.<ext>`
    pub file_name: String,
    pub path: PathBuf,
}

impl SourceImage {
    #[must_use]
    pub fn new(file_name: &str, path: PathBuf) -> Self {
        let id = file_name.split('.').next().unwrap_or(file_name).to_string();
        Self {
            id,
            file_name: file_name.to_string(),
            path,
        }
    }
}

/// File names derived for one conversion run against one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNaming {
    pub source_id: String,
    pub run_id: String,
}

impl RunNaming {
    /// Naming for a fresh run with a random run identifier
    #[must_use]
    pub fn fresh(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Common prefix of every file this run creates
    #[must_use]
    pub fn stem(&self) -> String {
        format!("{}_{}", self.source_id, self.run_id)
    }

    #[must_use]
    pub fn prepared_file_name(&self) -> String {
        format!("{}_prepped.png", self.stem())
    }

    #[must_use]
    pub fn bitmap_file_name(&self) -> String {
        format!("{}_bw.bmp", self.stem())
    }

    #[must_use]
    pub fn svg_file_name(&self) -> String {
        format!("{}.svg", self.stem())
    }
}

/// A finished SVG in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorArtifact {
    pub file_name: String,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("bw".parse::<ProcessingMode>().unwrap(), ProcessingMode::BlackWhite);
        assert_eq!(" Color ".parse::<ProcessingMode>().unwrap(), ProcessingMode::Color);
        let err = "sepia".parse::<ProcessingMode>().unwrap_err();
        assert!(err.to_string().contains("sepia"));
        assert_eq!(ProcessingMode::BlackWhite.to_string(), "bw");
        assert_eq!(ProcessingMode::default(), ProcessingMode::Color);
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&ProcessingMode::BlackWhite).unwrap();
        assert_eq!(json, "\"bw\"");
        let mode: ProcessingMode = serde_json::from_str("\"color\"").unwrap();
        assert_eq!(mode, ProcessingMode::Color);
    }

    #[test]
    fn test_mode_profiles() {
        let bw = ProcessingMode::BlackWhite.profile();
        assert_eq!(bw.preparation, Preparation::FlattenOnWhite);
        assert_eq!(bw.backend, BackendKind::Potrace);
        assert_eq!(bw.threshold_role, ThresholdRole::Binarization);
        assert_eq!(bw.default_threshold, 50);

        let color = ProcessingMode::Color.profile();
        assert_eq!(color.preparation, Preparation::Rgba);
        assert_eq!(color.backend, BackendKind::Vtracer);
        assert_eq!(color.threshold_role, ThresholdRole::MattingAggressiveness);
        assert_eq!(color.default_threshold, 20);
    }

    #[test]
    fn test_request_clamping() {
        let req = ProcessingRequest::new(ProcessingMode::Color)
            .with_colors(100)
            .with_detail(-4)
            .with_threshold(250);
        assert_eq!(req.color_count, 32);
        assert_eq!(req.detail_level, 1);
        assert_eq!(req.threshold, 100);

        let req = ProcessingRequest::new(ProcessingMode::Color).with_colors(0);
        assert_eq!(req.color_count, 2);
    }

    #[test]
    fn test_threshold_roles() {
        let bw = ProcessingRequest::new(ProcessingMode::BlackWhite).with_threshold(70);
        assert_eq!(bw.bw_threshold(), 70);
        assert_eq!(bw.matting_slider(), None);

        let color = ProcessingRequest::new(ProcessingMode::Color).with_threshold(70);
        assert_eq!(color.bw_threshold(), DEFAULT_BW_THRESHOLD);
        assert_eq!(color.matting_slider(), Some(70));
        assert_eq!(color.tool_params().bw_threshold, DEFAULT_BW_THRESHOLD);
    }

    #[test]
    fn test_source_image_id() {
        let src = SourceImage::new("abc-123.png", PathBuf::from("/up/abc-123.png"));
        assert_eq!(src.id, "abc-123");
        assert_eq!(src.file_name, "abc-123.png");
    }

    #[test]
    fn test_run_naming() {
        let naming = RunNaming {
            source_id: "src".to_string(),
            run_id: "run".to_string(),
        };
        assert_eq!(naming.svg_file_name(), "src_run.svg");
        assert_eq!(naming.prepared_file_name(), "src_run_prepped.png");
        assert_eq!(naming.bitmap_file_name(), "src_run_bw.bmp");

        let a = RunNaming::fresh("src");
        let b = RunNaming::fresh("src");
        assert_ne!(a.svg_file_name(), b.svg_file_name());
        assert!(a.svg_file_name().starts_with("src_"));
    }
}
