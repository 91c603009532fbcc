//! Query parameters of the shrink endpoint.
//!
//! Unparseable values are rejected with 400. Numeric values that parse but
//! fall outside their range fall back to the default, except `width` and
//! `height`: above the configured maximum they are rejected, below zero they
//! become 0 (no resize on that axis).

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::config::ServiceConfig;
use crate::http::response::ErrorResponse;
use crate::optimizer::{
    OptimizationOptions, DEFAULT_COMPRESSION, DEFAULT_QUALITY, DEFAULT_QUANT_TABLE,
};

/// Resolved parameters of one shrink request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrinkParams {
    /// Remote image to fetch instead of reading an upload.
    pub url: Option<String>,
    /// Encoder settings handed to the optimizer.
    pub options: OptimizationOptions,
    /// Target width in pixels; 0 leaves the axis to the aspect ratio.
    pub width: u32,
    /// Target height in pixels; 0 leaves the axis to the aspect ratio.
    pub height: u32,
}

impl ShrinkParams {
    /// Resize runs whenever either axis is set.
    pub fn resize(&self) -> bool {
        self.width > 0 || self.height > 0
    }
}

/// First non-empty value of each query key.
struct Query<'a>(HashMap<Cow<'a, str>, Cow<'a, str>>);

impl<'a> Query<'a> {
    fn parse(raw: &'a str) -> Self {
        let mut values = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            values.entry(key).or_insert(value);
        }
        Self(values)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_ref()).filter(|v| !v.is_empty())
    }

    fn int(&self, key: &str, label: &str) -> Result<Option<i64>, ErrorResponse> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };

        raw.parse::<i64>().map(Some).map_err(|e| {
            tracing::warn!(parameter = key, value = raw, error = %e, "Failed to parse shrink parameter");
            ErrorResponse::bad_request(format!(
                "Cannot parse the image {label} parameter. Please provide a valid integer and try again."
            ))
        })
    }

    fn flag(&self, key: &str, label: &str, default: bool) -> Result<bool, ErrorResponse> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };

        parse_bool(raw).ok_or_else(|| {
            tracing::warn!(parameter = key, value = raw, "Failed to parse shrink parameter");
            ErrorResponse::bad_request(format!(
                "Cannot parse the image {label} parameter. Please provide a valid boolean and try again."
            ))
        })
    }
}

/// Boolean spellings accepted in query strings.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn in_range_or(value: Option<i64>, range: RangeInclusive<i64>, default: u32) -> u32 {
    match value {
        Some(v) if range.contains(&v) => v as u32,
        _ => default,
    }
}

fn dimension(value: Option<i64>, axis: &str, max: u32) -> Result<u32, ErrorResponse> {
    match value {
        Some(v) if v > i64::from(max) => Err(ErrorResponse::bad_request(format!(
            "The image {axis} parameter cannot be greater than {max}. Please provide a valid integer and try again."
        ))),
        Some(v) if v > 0 => Ok(v as u32),
        _ => Ok(0),
    }
}

/// Resolve the shrink parameters from a raw query string.
pub fn parse_params(query: Option<&str>, service: &ServiceConfig) -> Result<ShrinkParams, ErrorResponse> {
    let query = Query::parse(query.unwrap_or_default());
    let defaults = OptimizationOptions::default();

    let options = OptimizationOptions {
        quality: in_range_or(query.int("quality", "quality")?, 1..=100, DEFAULT_QUALITY),
        compression: in_range_or(query.int("compression", "compression")?, 0..=9, DEFAULT_COMPRESSION),
        quant_table: in_range_or(
            query.int("quant_table", "quantization table")?,
            0..=8,
            DEFAULT_QUANT_TABLE,
        ),
        optimize_coding: query.flag("optimize_coding", "optimize coding", defaults.optimize_coding)?,
        interlace: query.flag("interlace", "interlace", defaults.interlace)?,
        strip_metadata: query.flag("strip_metadata", "strip metadata", defaults.strip_metadata)?,
        optimize_icc_profile: query.flag(
            "optimize_icc_profile",
            "optimize ICC profile",
            defaults.optimize_icc_profile,
        )?,
        trellis_quant: query.flag("trellis_quant", "trellis quant", defaults.trellis_quant)?,
        overshoot_deringing: query.flag(
            "overshoot_deringing",
            "overshoot deringing",
            defaults.overshoot_deringing,
        )?,
        optimize_scans: query.flag("optimize_scans", "optimize scans", defaults.optimize_scans)?,
    };

    let width = dimension(query.int("width", "width")?, "width", service.max_allowed_width)?;
    let height = dimension(query.int("height", "height")?, "height", service.max_allowed_height)?;

    Ok(ShrinkParams {
        url: query.get("url").map(str::to_string),
        options,
        width,
        height,
    })
}
