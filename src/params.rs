//! Transfer functions from UI sliders to native tool parameters
//!
//! Each external tool has its own discrete parameter space. The functions here
//! are the only place slider values get translated, so the mappings can be
//! tested without spawning anything.

use crate::types::{MAX_COLORS, MAX_DETAIL, MAX_THRESHOLD, MIN_COLORS, MIN_DETAIL};

/// Lowest vtracer color/path precision
pub const MIN_PRECISION: u8 = 1;
/// Highest vtracer color/path precision
pub const MAX_PRECISION: u8 = 8;
/// vtracer speckle filter, below the tool's default of 4 to keep small details
pub const FILTER_SPECKLE: u8 = 2;

/// Slider values as the vectorizer backends receive them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolParams {
    /// Color count slider (2-32)
    pub color_count: u8,
    /// Detail slider (1-10)
    pub detail_level: u8,
    /// Binarization threshold in percent (0-100)
    pub bw_threshold: u8,
}

fn linear_remap(value: u8, min: u8, max: u8) -> u8 {
    let clamped = f64::from(value.clamp(min, max));
    let span = f64::from(MAX_PRECISION - MIN_PRECISION) / f64::from(max - min);
    let mapped = (f64::from(MIN_PRECISION) + (clamped - f64::from(min)) * span).round();
    (mapped as u8).clamp(MIN_PRECISION, MAX_PRECISION)
}

/// Map the color count slider (2-32) onto vtracer `--color_precision` (1-8)
#[must_use]
pub fn color_precision(color_count: u8) -> u8 {
    linear_remap(color_count, MIN_COLORS, MAX_COLORS)
}

/// Map the detail slider (1-10) onto vtracer `--path_precision` (1-8)
#[must_use]
pub fn path_precision(detail_level: u8) -> u8 {
    linear_remap(detail_level, MIN_DETAIL, MAX_DETAIL)
}

/// Grayscale cut value for a binarization threshold in percent
///
/// Pixels strictly brighter than the returned value become background.
#[must_use]
pub fn bw_cut_value(threshold_percent: u8) -> u8 {
    let percent = f64::from(threshold_percent.min(MAX_THRESHOLD));
    (255.0 * percent / 100.0).round() as u8
}

/// Alpha-matting parameters for the background segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MattingParams {
    pub alpha_matting: bool,
    pub foreground_threshold: u8,
    pub background_threshold: u8,
    pub erode_size: u8,
}

impl MattingParams {
    /// Fixed parameters used outside color mode
    pub const DEFAULT: Self = Self {
        alpha_matting: true,
        foreground_threshold: 235,
        background_threshold: 15,
        erode_size: 1,
    };

    /// Cubic curve from the aggressiveness slider (0-100)
    ///
    /// Slider 0 gives foreground 250 / background 10, slider 100 gives
    /// 225 / 35. The cube keeps the low end of the slider fine grained.
    #[must_use]
    pub fn from_slider(slider: u8) -> Self {
        let normalized = f64::from(slider.min(MAX_THRESHOLD)) / 100.0;
        let scaled = normalized.powi(3);
        Self {
            foreground_threshold: (250.0 - scaled * 25.0).round() as u8,
            background_threshold: (10.0 + scaled * 25.0).round() as u8,
            ..Self::DEFAULT
        }
    }

    /// Curve parameters when a slider applies, fixed defaults otherwise
    #[must_use]
    pub fn for_slider(slider: Option<u8>) -> Self {
        slider.map_or(Self::DEFAULT, Self::from_slider)
    }
}

impl Default for MattingParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}
