//! The processing pipeline: a fixed, ordered dispatch of imaging
//! capabilities for one parsed [`Request`].
//!
//! For every request the processor performs, strictly in order:
//!
//! 1. Decode pixel data and bounds
//! 2. Rewind the source and read metadata; normalize orientation if the
//!    EXIF tag is present
//! 3. Trim the uniform border with the configured fuzziness
//! 4. Crop the requested region (none for `full`)
//! 5. Resolve target dimensions against the configured maximum and scale
//! 6. Encode in the requested format
//!
//! The first failure aborts the run; nothing is written on error paths
//! before the encode step, so no partial output is produced by the core.
//!
//! The core is stateless: one `Processor` may serve concurrent callers as
//! long as each brings its own source/sink pair.

use crate::geometry::{Dimensions, GeometryError, calculate_dimensions};
use crate::imaging::{BackendError, EncodeParams, ImageBackend};
use crate::request::{Format, InvalidSpec, Region, Request, parse_spec};
use std::io::{Read, Seek, SeekFrom, Write};
use thiserror::Error;

/// Fixed JPEG encode quality.
const JPEG_QUALITY: u8 = 98;
/// Fixed GIF palette size.
const GIF_PALETTE_SIZE: u16 = 256;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid spec: {0}")]
    Spec(#[from] InvalidSpec),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// Limits and tuning injected into the pipeline at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessConfig {
    /// Hard ceiling on output dimensions; resolving past it fails.
    pub max_dimensions: Dimensions,
    /// Fuzziness for the border trim step. The client-supplied
    /// `trimBorder` option is carried on the request but this pipeline
    /// variant always trims with the configured value.
    pub trim_fuzziness: f64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_dimensions: Dimensions {
                width: 6000,
                height: 6000,
            },
            trim_fuzziness: 0.1,
        }
    }
}

/// Drives the transform sequence for parsed requests against a backend.
pub struct Processor<B> {
    backend: B,
    config: ProcessConfig,
}

impl<B: ImageBackend> Processor<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ProcessConfig::default())
    }

    pub fn with_config(backend: B, config: ProcessConfig) -> Self {
        Self { backend, config }
    }

    /// Parse `spec` and process `source` into `sink` in one call.
    pub fn process_spec<R, W>(
        &self,
        spec: &str,
        source: &mut R,
        sink: &mut W,
    ) -> Result<(), ProcessError>
    where
        R: Read + Seek,
        W: Write,
    {
        let request = parse_spec(spec)?;
        self.process(&request, source, sink)
    }

    /// Run the full transform sequence for one request.
    ///
    /// The source is read twice — pixels first, then metadata after a
    /// rewind — so it must support seeking back to the start.
    pub fn process<R, W>(
        &self,
        request: &Request,
        source: &mut R,
        sink: &mut W,
    ) -> Result<(), ProcessError>
    where
        R: Read + Seek,
        W: Write,
    {
        let (mut image, _) = self.backend.decode(source)?;

        source.seek(SeekFrom::Start(0))?;
        let metadata = self.backend.read_metadata(source)?;
        if let Some(orientation) = metadata.orientation {
            image = self.backend.normalize_orientation(image, orientation)?;
        }

        image = self.backend.trim(image, self.config.trim_fuzziness)?;

        image = match request.region {
            Region::Full => image,
            Region::Square => self.backend.crop_square(image)?,
            Region::Absolute(rect) => self.backend.crop_rect(image, rect)?,
            Region::Relative(region) => self.backend.crop_relative(image, region)?,
        };

        let target = calculate_dimensions(
            &request.size,
            self.backend.dimensions(&image),
            self.config.max_dimensions,
        )?;
        let image = self.backend.scale(image, target)?;

        let params = match request.format {
            Format::Default | Format::Png => EncodeParams::Png,
            Format::Jpeg => EncodeParams::Jpeg {
                quality: JPEG_QUALITY,
            },
            Format::Gif => EncodeParams::Gif {
                palette_size: GIF_PALETTE_SIZE,
            },
        };
        self.backend.encode(sink, &image, params)?;
        Ok(())
    }
}
