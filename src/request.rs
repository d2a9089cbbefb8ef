//! Spec-string parsing: `identifier/region/size/rotation/quality.format[?query]`.
//!
//! One fixed pattern splits the five path segments plus an optional query
//! string; each segment then has its own small grammar. Every malformed or
//! unsupported token is rejected up front with [`InvalidSpec`] — no image
//! data is touched until the whole spec has validated.
//!
//! Segment grammars:
//! - region: `full` | `square` | `pct:x,y,w,h` | `x,y,w,h`
//! - size: `full` | `max` | `pct:n` | `w,h` | `w,` | `,h` | `!w,h`
//! - rotation: `0` (anything else is unsupported)
//! - quality: `default` | `color`
//! - format: `jpg` | `png` | `gif` (absent → png)
//!
//! Recognized query options: `trimBorder` (float in `[0, 0.999)`) and
//! `autoOrient` (`true`/`false`). Unknown keys and empty values are ignored.
//!
//! The identifier is query-unescaped: `+` reads as a space and a `%` not
//! followed by two hex digits is an error.

use crate::geometry::{Rect, RelativeRegion};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Malformed or unsupported client input. The message is safe to echo back
/// to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidSpec(pub String);

/// The sub-rectangle of the source image to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// The whole image.
    Full,
    /// The largest centered square.
    Square,
    /// A pixel rectangle.
    Absolute(Rect),
    /// A rectangle in percentages of the image bounds.
    Relative(RelativeRegion),
}

/// The target pixel dimensions (or scaling rule) for the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    /// Keep the input dimensions.
    Full,
    /// Fit within the configured maximum, only shrinking when needed.
    Max,
    /// Explicit width and/or height. With `best_fit` (the `!` prefix) or a
    /// missing axis the aspect ratio is preserved; with both axes and no
    /// `best_fit` the image is stretched to exactly width×height.
    Absolute {
        width: Option<u32>,
        height: Option<u32>,
        best_fit: bool,
    },
    /// A single scale factor applied to both axes, stored as a fraction
    /// (`pct:50` → 0.5).
    Relative(f64),
}

/// Output encoding, derived from the spec's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// No extension given; encodes as PNG.
    Default,
    Jpeg,
    Png,
    Gif,
}

/// Extension → format table. Immutable; unknown extensions are rejected.
const FORMAT_EXTENSIONS: &[(&str, Format)] = &[
    ("jpg", Format::Jpeg),
    ("png", Format::Png),
    ("gif", Format::Gif),
];

/// A fully parsed and validated image request. Immutable once built;
/// consumed once by the processing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Opaque upstream locator, percent-decoded.
    pub identifier: String,
    pub region: Region,
    pub size: Size,
    pub format: Format,
    pub auto_orient: bool,
    pub trim_border: bool,
    pub trim_border_fuzziness: f64,
}

// identifier / region / size / rotation / quality [.format] [?query]
// Region, size, rotation and quality may be empty (they default); the
// identifier may not.
static SPEC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^/]+)/([^/]*)/([^/]*)/([^/]*)/([^./?]*)(?:\.([^?/]+))?(?:\?(.*))?$")
        .expect("spec pattern compiles")
});

/// Parse a raw spec string into a [`Request`].
///
/// ```
/// # use picslice::request::{parse_spec, Format, Region, Size};
/// let req = parse_spec("foo%2Fbar/square/pct:50/0/default.jpg?autoOrient=true").unwrap();
/// assert_eq!(req.identifier, "foo/bar");
/// assert_eq!(req.region, Region::Square);
/// assert_eq!(req.size, Size::Relative(0.5));
/// assert_eq!(req.format, Format::Jpeg);
/// assert!(req.auto_orient);
/// ```
pub fn parse_spec(spec: &str) -> Result<Request, InvalidSpec> {
    let parts = SPEC_PATTERN
        .captures(spec)
        .ok_or_else(|| InvalidSpec(format!("not a valid spec: {spec:?}")))?;
    let segment = |i: usize| parts.get(i).map_or("", |m| m.as_str());

    let identifier = decode_identifier(segment(1))?;

    let region = parse_region(segment(2))?;
    let size = parse_size(segment(3))?;

    let rotation = segment(4);
    if !rotation.is_empty() && rotation != "0" {
        return Err(InvalidSpec(format!("unsupported rotation {rotation:?}")));
    }

    let quality = segment(5);
    match quality {
        "" | "color" | "default" => {}
        other => return Err(InvalidSpec(format!("unsupported quality {other:?}"))),
    }

    let format = match parts.get(6) {
        None => Format::Default,
        Some(ext) => FORMAT_EXTENSIONS
            .iter()
            .find(|(name, _)| *name == ext.as_str())
            .map(|(_, format)| *format)
            .ok_or_else(|| InvalidSpec(format!("unsupported format {:?}", ext.as_str())))?,
    };

    let mut auto_orient = false;
    let mut trim_border = false;
    let mut trim_border_fuzziness = 0.0;
    if let Some(query) = parts.get(7) {
        for (key, value) in url::form_urlencoded::parse(query.as_str().as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "trimBorder" => {
                    let fuzziness = parse_float(&value)?;
                    if !(0.0..0.999).contains(&fuzziness) {
                        return Err(InvalidSpec(format!(
                            "value outside of range 0..0.999: {fuzziness}"
                        )));
                    }
                    trim_border_fuzziness = fuzziness;
                    trim_border = trim_border_fuzziness > 0.0;
                }
                "autoOrient" => auto_orient = parse_boolean(&value)?,
                _ => {}
            }
        }
    }

    Ok(Request {
        identifier,
        region,
        size,
        format,
        auto_orient,
        trim_border,
        trim_border_fuzziness,
    })
}

impl FromStr for Request {
    type Err = InvalidSpec;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        parse_spec(spec)
    }
}

// Query-style unescaping: every `%` must start a two-hex-digit escape,
// and a bare `+` stands for a space.
fn decode_identifier(raw: &str) -> Result<String, InvalidSpec> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(InvalidSpec(format!("invalid escape in identifier: {raw:?}")));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    // `%2B` survives the replacement and decodes to a literal `+` below.
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map_err(|_| InvalidSpec(format!("identifier is not valid UTF-8: {raw:?}")))
        .map(|decoded| decoded.into_owned())
}

/// Parse a region token. See the [module docs](self) for the grammar.
pub fn parse_region(token: &str) -> Result<Region, InvalidSpec> {
    match token {
        "" | "full" => return Ok(Region::Full),
        "square" => return Ok(Region::Square),
        _ => {}
    }
    if let Some(rest) = token.strip_prefix("pct:") {
        return Ok(Region::Relative(parse_percentage_coords(rest)?));
    }
    Ok(Region::Absolute(parse_rectangle(token)?))
}

/// Parse a size token. See the [module docs](self) for the grammar.
///
/// Relative sizes accept `0 < n <= 100`; upscaling percentages are
/// rejected. A zero width or height is likewise rejected rather than
/// producing an empty output.
pub fn parse_size(token: &str) -> Result<Size, InvalidSpec> {
    match token {
        "" | "full" => return Ok(Size::Full),
        "max" => return Ok(Size::Max),
        _ => {}
    }

    if let Some(rest) = token.strip_prefix("pct:") {
        let pct = parse_float(rest)?;
        if !(pct > 0.0 && pct <= 100.0) {
            return Err(InvalidSpec(format!(
                "size percentage outside of range 0..100: {pct}"
            )));
        }
        return Ok(Size::Relative(pct / 100.0));
    }

    let (token, best_fit) = match token.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    let Some((w, h)) = token.split_once(',') else {
        return Err(InvalidSpec(format!("not a valid size: {token:?}")));
    };
    let width = parse_axis(w)?;
    let height = parse_axis(h)?;
    if width.is_none() && height.is_none() {
        return Err(InvalidSpec(format!("not a valid size: {token:?}")));
    }
    Ok(Size::Absolute {
        width,
        height,
        best_fit,
    })
}

/// One side of a `w,h` size: empty means "derive from aspect ratio",
/// zero is rejected.
fn parse_axis(value: &str) -> Result<Option<u32>, InvalidSpec> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<u32>() {
        Ok(0) => Err(InvalidSpec(format!("dimension must be positive: {value:?}"))),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(InvalidSpec(format!("not a valid dimension: {value:?}"))),
    }
}

fn parse_percentage_coords(value: &str) -> Result<RelativeRegion, InvalidSpec> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 4 {
        return Err(InvalidSpec(format!(
            "expected four percentage coordinates: {value:?}"
        )));
    }
    let mut coords = [0.0; 4];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        let pct = parse_float(part)?;
        if !(0.0..=100.0).contains(&pct) {
            return Err(InvalidSpec(format!(
                "percentage outside of range 0..100: {pct}"
            )));
        }
        *slot = pct;
    }
    Ok(RelativeRegion {
        x: coords[0],
        y: coords[1],
        width: coords[2],
        height: coords[3],
    })
}

fn parse_rectangle(value: &str) -> Result<Rect, InvalidSpec> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 4 {
        return Err(InvalidSpec(format!("not a valid region: {value:?}")));
    }
    let mut fields = [0u32; 4];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| InvalidSpec(format!("not a valid region: {value:?}")))?;
    }
    Ok(Rect {
        x: fields[0],
        y: fields[1],
        width: fields[2],
        height: fields[3],
    })
}

fn parse_float(value: &str) -> Result<f64, InvalidSpec> {
    value
        .parse()
        .map_err(|_| InvalidSpec(format!("not a floating-point value: {value:?}")))
}

fn parse_boolean(value: &str) -> Result<bool, InvalidSpec> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(InvalidSpec(format!("not a boolean value: {value:?}"))),
    }
}
