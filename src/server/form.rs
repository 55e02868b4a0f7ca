//! Request parsing for the upload form and the reprocess body
//!
//! Both endpoints are forgiving about numbers: anything that does not parse
//! as an integer falls back to the field default, and every value is clamped
//! by [`ProcessingRequest`].

use super::error::ApiError;
use crate::services::StorageLayout;
use crate::types::{ProcessingMode, ProcessingRequest, DEFAULT_COLORS, DEFAULT_DETAIL};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parse an integer form field, falling back to `default`
#[must_use]
pub fn lenient_int(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Integer from a JSON value, falling back to `default`
///
/// Numbers are truncated toward zero and numeric strings are accepted.
#[must_use]
pub fn lenient_json_int(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => lenient_int(Some(s), default),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => default,
    }
}

/// Truthiness of a JSON flag; empty and zero values are false
#[must_use]
pub fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn parse_mode(raw: Option<&str>) -> Result<ProcessingMode, ApiError> {
    raw.map_or(Ok(ProcessingMode::default()), |s| s.parse::<ProcessingMode>())
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Text fields of the multipart upload form
#[derive(Debug, Default, Clone)]
pub struct UploadForm {
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.fields.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Build the processing request
    ///
    /// Each mode reads its own threshold field: `bg_threshold_bw` for
    /// black/white, `bg_threshold_col` for color. A form without `mode`
    /// converts in color but only looks at `bg_threshold_bw`, so the color
    /// slider keeps its default. Background removal is only enabled by the
    /// checkbox value `on`.
    ///
    /// # Errors
    /// - Unknown `mode`
    pub fn to_request(&self) -> Result<ProcessingRequest, ApiError> {
        let mode = parse_mode(self.get("mode"))?;
        let threshold_source = if self.get("mode").is_some() {
            mode
        } else {
            ProcessingMode::BlackWhite
        };
        let default_threshold = i64::from(mode.profile().default_threshold);
        let threshold = if threshold_source == mode {
            lenient_int(self.get(Self::threshold_field(mode)), default_threshold)
        } else {
            default_threshold
        };

        Ok(ProcessingRequest::new(mode)
            .with_colors(lenient_int(self.get("colors"), i64::from(DEFAULT_COLORS)))
            .with_detail(lenient_int(self.get("detail"), i64::from(DEFAULT_DETAIL)))
            .with_threshold(threshold)
            .with_background_removal(self.get("remove_bg") == Some("on")))
    }

    fn threshold_field(mode: ProcessingMode) -> &'static str {
        match mode {
            ProcessingMode::BlackWhite => "bg_threshold_bw",
            ProcessingMode::Color => "bg_threshold_col",
        }
    }
}

/// Validated reprocess request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprocessBody {
    pub input_filename: String,
    pub request: ProcessingRequest,
}

impl ReprocessBody {
    /// Parse and validate a raw JSON body
    ///
    /// Checks run in a fixed order: body shape, presence of the file name,
    /// file name safety, then mode. Existence of the file is left to the
    /// caller.
    ///
    /// # Errors
    /// - `Invalid request data` for bodies that are not a non-empty object
    /// - `Missing input filename` / `Invalid input filename`
    /// - Unknown `mode`
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let data: Map<String, Value> = match serde_json::from_slice(body) {
            Ok(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(ApiError::bad_request("Invalid request data")),
        };

        let input_filename = match data.get("input_filename") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(value) if json_truthy(value) => {
                return Err(ApiError::bad_request("Invalid input filename"))
            },
            _ => return Err(ApiError::bad_request("Missing input filename")),
        };
        if !StorageLayout::is_safe_file_name(&input_filename) {
            return Err(ApiError::bad_request("Invalid input filename"));
        }

        let mode = match data.get("mode") {
            None | Some(Value::Null) => ProcessingMode::default(),
            Some(Value::String(raw)) => parse_mode(Some(raw))?,
            Some(other) => {
                return Err(ApiError::bad_request(format!(
                    "Invalid mode '{}' (expected 'bw' or 'color')",
                    other
                )))
            },
        };
        let default_threshold = i64::from(mode.profile().default_threshold);

        let request = ProcessingRequest::new(mode)
            .with_colors(lenient_json_int(data.get("colors"), i64::from(DEFAULT_COLORS)))
            .with_detail(lenient_json_int(data.get("detail"), i64::from(DEFAULT_DETAIL)))
            .with_threshold(lenient_json_int(data.get("bg_threshold"), default_threshold))
            .with_background_removal(data.get("remove_bg").map_or(true, json_truthy));

        Ok(Self {
            input_filename,
            request,
        })
    }
}
