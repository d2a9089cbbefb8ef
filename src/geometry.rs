//! Pure dimension math for resolving a [`Size`] against image bounds.
//!
//! All functions here are pure and testable without any I/O or pixels.
//! The shared geometry types ([`Dimensions`], [`Rect`], [`RelativeRegion`])
//! also live here so the request grammar and the imaging backend agree on
//! one vocabulary.

use crate::request::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel dimensions of an image or a scaling target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An absolute pixel rectangle (x, y, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A rectangle expressed as percentages of the image bounds, each axis
/// in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolved dimensions exceed the configured maximum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("({width}, {height}) exceeds maximum allowed dimensions ({max_width}, {max_height})")]
pub struct GeometryError {
    pub width: u32,
    pub height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

/// Round half-up: 400.5 → 401, 400.4 → 400.
fn round_half_up(value: f64) -> u32 {
    (value + 0.5).floor() as u32
}

/// Fit `input` within an optionally-constrained box, preserving aspect ratio.
///
/// - One axis given: the other is derived from the input's aspect ratio.
/// - Both given: the input is scaled by the smaller ratio, so neither
///   target axis is exceeded (beyond rounding).
/// - Neither given: the input passes through unchanged.
///
/// Inputs and results are clamped to at least 1 pixel per axis, so callers
/// may feed values that rounded down to zero.
pub fn fit_dimensions(input: Dimensions, width: Option<u32>, height: Option<u32>) -> Dimensions {
    let in_w = input.width.max(1) as f64;
    let in_h = input.height.max(1) as f64;

    let (out_w, out_h) = match (width, height) {
        (None, None) => (in_w, in_h),
        (Some(w), None) => {
            let w = w.max(1) as f64;
            (w, w * in_h / in_w)
        }
        (None, Some(h)) => {
            let h = h.max(1) as f64;
            (h * in_w / in_h, h)
        }
        (Some(w), Some(h)) => {
            let scale = (w.max(1) as f64 / in_w).min(h.max(1) as f64 / in_h);
            (in_w * scale, in_h * scale)
        }
    };

    Dimensions {
        width: round_half_up(out_w).max(1),
        height: round_half_up(out_h).max(1),
    }
}

/// Resolve a parsed [`Size`] to concrete output dimensions.
///
/// `input` is the post-crop image size; `max` is the hard ceiling. Every
/// variant — including `Full` — is checked against `max` after resolution,
/// so an oversized source cannot slip through as a passthrough.
pub fn calculate_dimensions(
    size: &Size,
    input: Dimensions,
    max: Dimensions,
) -> Result<Dimensions, GeometryError> {
    let result = match *size {
        Size::Full => input,
        Size::Max => {
            if input.width > max.width || input.height > max.height {
                fit_dimensions(input, Some(max.width), Some(max.height))
            } else {
                input
            }
        }
        Size::Absolute {
            width: Some(width),
            height: Some(height),
            best_fit: false,
        } => Dimensions { width, height },
        Size::Absolute { width, height, .. } => fit_dimensions(input, width, height),
        Size::Relative(factor) => {
            let w = round_half_up(input.width as f64 * factor);
            let h = round_half_up(input.height as f64 * factor);
            fit_dimensions(input, Some(w), Some(h))
        }
    };
    check_dimensions(result, max)
}

fn check_dimensions(result: Dimensions, max: Dimensions) -> Result<Dimensions, GeometryError> {
    if result.width > max.width || result.height > max.height {
        return Err(GeometryError {
            width: result.width,
            height: result.height,
            max_width: max.width,
            max_height: max.height,
        });
    }
    Ok(result)
}
