//! Imaging collaborator traits and shared types.
//!
//! [`ImageBackend`] groups the three capability sets the pipeline consumes:
//!
//! - **Codec**: `decode` / `encode`
//! - **MetadataReader**: `read_metadata` (EXIF orientation)
//! - **ImageOps**: `normalize_orientation`, `trim`, the three crops,
//!   `scale`, `dimensions`
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust on the
//! `image` crate. Tests use [`tests::MockBackend`], which records the
//! dispatched operations instead of touching pixels.

use crate::geometry::{Dimensions, Rect, RelativeRegion};
use std::io::{Read, Seek, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Metadata extracted from the source bytes before any transform runs.
///
/// `orientation` is the raw EXIF Orientation value (1–8) when the tag is
/// present. Sources without EXIF (e.g. most PNGs) yield the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub orientation: Option<u16>,
}

/// Parameters passed to [`ImageBackend::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeParams {
    Png,
    Jpeg { quality: u8 },
    Gif { palette_size: u16 },
}

/// Trait for imaging backends.
///
/// `Image` is an opaque in-memory handle; the pipeline threads it through
/// the transform calls by value and never inspects it beyond
/// [`dimensions`](ImageBackend::dimensions).
pub trait ImageBackend {
    type Image;

    /// Decode pixel data from a seekable source, returning the handle and
    /// its bounds.
    fn decode<R: Read + Seek>(
        &self,
        source: &mut R,
    ) -> Result<(Self::Image, Dimensions), BackendError>;

    /// Read embedded metadata from the (rewound) source. A source without
    /// metadata is not an error.
    fn read_metadata<R: Read + Seek>(&self, source: &mut R)
    -> Result<ImageMetadata, BackendError>;

    /// Undo an EXIF orientation (raw tag value 1–8).
    fn normalize_orientation(
        &self,
        image: Self::Image,
        orientation: u16,
    ) -> Result<Self::Image, BackendError>;

    /// Trim a uniform border. `fuzziness` in `[0, 1)` controls how much a
    /// pixel may deviate from the border color and still be trimmed.
    fn trim(&self, image: Self::Image, fuzziness: f64) -> Result<Self::Image, BackendError>;

    /// Crop to an absolute pixel rectangle, clamped to the image bounds.
    fn crop_rect(&self, image: Self::Image, rect: Rect) -> Result<Self::Image, BackendError>;

    /// Crop to a rectangle given in percentages of the image bounds.
    fn crop_relative(
        &self,
        image: Self::Image,
        region: RelativeRegion,
    ) -> Result<Self::Image, BackendError>;

    /// Crop to the largest centered square.
    fn crop_square(&self, image: Self::Image) -> Result<Self::Image, BackendError>;

    /// Resample to exactly `target` (stretching if the aspect differs —
    /// aspect decisions happen in geometry resolution, not here).
    fn scale(&self, image: Self::Image, target: Dimensions) -> Result<Self::Image, BackendError>;

    /// Current bounds of a handle.
    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Encode to the sink.
    fn encode<W: Write>(
        &self,
        sink: &mut W,
        image: &Self::Image,
        params: EncodeParams,
    ) -> Result<(), BackendError>;
}
