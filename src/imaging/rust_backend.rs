//! Pure Rust imaging backend — zero external dependencies.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | `image` crate, format guessed from magic bytes |
//! | EXIF orientation | `kamadak-exif`, `Orientation` tag only |
//! | Crop | `image::DynamicImage::crop_imm`, clamped to bounds |
//! | Border trim | bounding box of pixels differing from the corner color |
//! | Scale | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → PNG / JPEG / GIF | `image` codecs |

use super::backend::{BackendError, EncodeParams, ImageBackend, ImageMetadata};
use crate::geometry::{Dimensions, Rect, RelativeRegion};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageReader, Rgba};
use std::io::{BufReader, Read, Seek, Write};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn bounds(image: &DynamicImage) -> Dimensions {
    Dimensions {
        width: image.width(),
        height: image.height(),
    }
}

/// Clamp a requested crop to the image bounds. Empty intersections are an
/// error rather than a zero-sized image.
fn clamp_rect(rect: Rect, dims: Dimensions) -> Result<Rect, BackendError> {
    let x = rect.x.min(dims.width);
    let y = rect.y.min(dims.height);
    let width = rect.width.min(dims.width - x);
    let height = rect.height.min(dims.height - y);
    if width == 0 || height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "crop region ({}, {}, {}, {}) lies outside image bounds ({}, {})",
            rect.x, rect.y, rect.width, rect.height, dims.width, dims.height
        )));
    }
    Ok(Rect {
        x,
        y,
        width,
        height,
    })
}

fn percentage_to_pixels(value: f64, extent: u32) -> u32 {
    (extent as f64 * value / 100.0).round() as u32
}

/// Whether two pixels differ by more than the tolerance on any channel.
fn differs(a: Rgba<u8>, b: Rgba<u8>, tolerance: i32) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .any(|(x, y)| (i32::from(*x) - i32::from(*y)).abs() > tolerance)
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn decode<R: Read + Seek>(
        &self,
        source: &mut R,
    ) -> Result<(DynamicImage, Dimensions), BackendError> {
        let reader = ImageReader::new(BufReader::new(source))
            .with_guessed_format()
            .map_err(BackendError::Io)?;
        let image = reader
            .decode()
            .map_err(|e| BackendError::ProcessingFailed(format!("failed to decode image: {e}")))?;
        let dims = bounds(&image);
        Ok((image, dims))
    }

    fn read_metadata<R: Read + Seek>(
        &self,
        source: &mut R,
    ) -> Result<ImageMetadata, BackendError> {
        let mut reader = BufReader::new(source);
        // A source without an EXIF container (most PNGs and GIFs) is
        // ordinary, not a failure.
        let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
            return Ok(ImageMetadata::default());
        };
        let orientation = exif
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(|value| value as u16);
        Ok(ImageMetadata { orientation })
    }

    fn normalize_orientation(
        &self,
        image: DynamicImage,
        orientation: u16,
    ) -> Result<DynamicImage, BackendError> {
        let normalized = match orientation {
            2 => image.fliph(),
            3 => image.rotate180(),
            4 => image.flipv(),
            5 => image.rotate90().fliph(),
            6 => image.rotate90(),
            7 => image.rotate270().fliph(),
            8 => image.rotate270(),
            // 1 is upright; out-of-spec values are left alone.
            _ => image,
        };
        Ok(normalized)
    }

    fn trim(&self, image: DynamicImage, fuzziness: f64) -> Result<DynamicImage, BackendError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Ok(image);
        }
        let border = *rgba.get_pixel(0, 0);
        let tolerance = (fuzziness.clamp(0.0, 1.0) * 255.0) as i32;

        let mut min_x = width;
        let mut min_y = height;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut found = false;
        for (x, y, pixel) in rgba.enumerate_pixels() {
            if differs(*pixel, border, tolerance) {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                found = true;
            }
        }
        // A fully uniform image has no content to keep; leave it as is.
        if !found || (min_x == 0 && min_y == 0 && max_x == width - 1 && max_y == height - 1) {
            return Ok(image);
        }
        Ok(image.crop_imm(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    fn crop_rect(&self, image: DynamicImage, rect: Rect) -> Result<DynamicImage, BackendError> {
        let rect = clamp_rect(rect, bounds(&image))?;
        Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
    }

    fn crop_relative(
        &self,
        image: DynamicImage,
        region: RelativeRegion,
    ) -> Result<DynamicImage, BackendError> {
        let dims = bounds(&image);
        let rect = Rect {
            x: percentage_to_pixels(region.x, dims.width),
            y: percentage_to_pixels(region.y, dims.height),
            width: percentage_to_pixels(region.width, dims.width),
            height: percentage_to_pixels(region.height, dims.height),
        };
        self.crop_rect(image, rect)
    }

    fn crop_square(&self, image: DynamicImage) -> Result<DynamicImage, BackendError> {
        let dims = bounds(&image);
        let side = dims.width.min(dims.height);
        if side == 0 {
            return Err(BackendError::ProcessingFailed(
                "cannot square-crop an empty image".to_string(),
            ));
        }
        let x = (dims.width - side) / 2;
        let y = (dims.height - side) / 2;
        Ok(image.crop_imm(x, y, side, side))
    }

    fn scale(&self, image: DynamicImage, target: Dimensions) -> Result<DynamicImage, BackendError> {
        if bounds(&image) == target {
            return Ok(image);
        }
        Ok(image.resize_exact(target.width, target.height, FilterType::Lanczos3))
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        bounds(image)
    }

    fn encode<W: Write>(
        &self,
        sink: &mut W,
        image: &DynamicImage,
        params: EncodeParams,
    ) -> Result<(), BackendError> {
        match params {
            EncodeParams::Png => image
                .write_with_encoder(PngEncoder::new(sink))
                .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}"))),
            EncodeParams::Jpeg { quality } => image
                .write_with_encoder(JpegEncoder::new_with_quality(sink, quality))
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}"))),
            EncodeParams::Gif { palette_size } => {
                // The gif encoder always quantizes to a full 256-entry
                // palette; smaller palettes are not supported.
                if palette_size != 256 {
                    return Err(BackendError::ProcessingFailed(format!(
                        "unsupported GIF palette size {palette_size}"
                    )));
                }
                let rgba = image.to_rgba8();
                let (width, height) = rgba.dimensions();
                GifEncoder::new(sink)
                    .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// Gradient test image so crops land on distinguishable content.
    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    /// Encode a gradient as PNG bytes for decode tests.
    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        gradient(width, height)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn decode_reports_bounds() {
        let backend = RustBackend::new();
        let mut source = Cursor::new(png_bytes(200, 150));
        let (image, decoded) = backend.decode(&mut source).unwrap();
        assert_eq!(decoded, dims(200, 150));
        assert_eq!(backend.dimensions(&image), decoded);
    }

    #[test]
    fn decode_garbage_fails() {
        let backend = RustBackend::new();
        let mut source = Cursor::new(b"not an image".to_vec());
        assert!(backend.decode(&mut source).is_err());
    }

    #[test]
    fn read_metadata_without_exif_is_empty() {
        let backend = RustBackend::new();
        let mut source = Cursor::new(png_bytes(10, 10));
        let meta = backend.read_metadata(&mut source).unwrap();
        assert_eq!(meta, ImageMetadata::default());
    }

    #[test]
    fn normalize_orientation_rotations_transpose() {
        let backend = RustBackend::new();
        for orientation in [5, 6, 7, 8] {
            let out = backend
                .normalize_orientation(gradient(80, 60), orientation)
                .unwrap();
            assert_eq!(backend.dimensions(&out), dims(60, 80), "tag {orientation}");
        }
    }

    #[test]
    fn normalize_orientation_flips_keep_bounds() {
        let backend = RustBackend::new();
        for orientation in [1, 2, 3, 4] {
            let out = backend
                .normalize_orientation(gradient(80, 60), orientation)
                .unwrap();
            assert_eq!(backend.dimensions(&out), dims(80, 60), "tag {orientation}");
        }
    }

    #[test]
    fn crop_rect_exact() {
        let backend = RustBackend::new();
        let out = backend
            .crop_rect(
                gradient(100, 100),
                Rect {
                    x: 10,
                    y: 20,
                    width: 30,
                    height: 40,
                },
            )
            .unwrap();
        assert_eq!(backend.dimensions(&out), dims(30, 40));
    }

    #[test]
    fn crop_rect_clamps_overhang() {
        let backend = RustBackend::new();
        let out = backend
            .crop_rect(
                gradient(100, 100),
                Rect {
                    x: 90,
                    y: 90,
                    width: 50,
                    height: 50,
                },
            )
            .unwrap();
        assert_eq!(backend.dimensions(&out), dims(10, 10));
    }

    #[test]
    fn crop_rect_outside_bounds_errors() {
        let backend = RustBackend::new();
        let result = backend.crop_rect(
            gradient(100, 100),
            Rect {
                x: 200,
                y: 0,
                width: 10,
                height: 10,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn crop_relative_half() {
        let backend = RustBackend::new();
        let out = backend
            .crop_relative(
                gradient(200, 100),
                RelativeRegion {
                    x: 25.0,
                    y: 25.0,
                    width: 50.0,
                    height: 50.0,
                },
            )
            .unwrap();
        assert_eq!(backend.dimensions(&out), dims(100, 50));
    }

    #[test]
    fn crop_square_centers_on_short_side() {
        let backend = RustBackend::new();
        let out = backend.crop_square(gradient(200, 100)).unwrap();
        assert_eq!(backend.dimensions(&out), dims(100, 100));
    }

    #[test]
    fn scale_stretches_to_exact_target() {
        let backend = RustBackend::new();
        let out = backend.scale(gradient(200, 100), dims(50, 50)).unwrap();
        assert_eq!(backend.dimensions(&out), dims(50, 50));
    }

    #[test]
    fn trim_removes_uniform_border() {
        // White canvas with a centered red block.
        let mut img = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        for y in 40..60 {
            for x in 30..70 {
                img.put_pixel(x, y, Rgb([200, 0, 0]));
            }
        }
        let backend = RustBackend::new();
        let out = backend.trim(DynamicImage::ImageRgb8(img), 0.1).unwrap();
        assert_eq!(backend.dimensions(&out), dims(40, 20));
    }

    #[test]
    fn trim_uniform_image_is_untouched() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])));
        let backend = RustBackend::new();
        let out = backend.trim(img, 0.1).unwrap();
        assert_eq!(backend.dimensions(&out), dims(50, 50));
    }

    #[test]
    fn trim_fuzziness_tolerates_noise() {
        // Border is near-white noise within the 0.1 tolerance band.
        let mut img = RgbImage::from_fn(100, 100, |x, y| {
            Rgb([255 - ((x + y) % 10) as u8, 250, 252])
        });
        for y in 40..60 {
            for x in 40..60 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let backend = RustBackend::new();
        let out = backend.trim(DynamicImage::ImageRgb8(img), 0.1).unwrap();
        assert_eq!(backend.dimensions(&out), dims(20, 20));
    }

    #[test]
    fn encode_png_round_trips() {
        let backend = RustBackend::new();
        let mut sink = Cursor::new(Vec::new());
        backend
            .encode(&mut sink, &gradient(40, 30), EncodeParams::Png)
            .unwrap();
        let mut reread = Cursor::new(sink.into_inner());
        let (_, decoded) = backend.decode(&mut reread).unwrap();
        assert_eq!(decoded, dims(40, 30));
    }

    #[test]
    fn encode_jpeg_round_trips() {
        let backend = RustBackend::new();
        let mut sink = Cursor::new(Vec::new());
        backend
            .encode(&mut sink, &gradient(40, 30), EncodeParams::Jpeg { quality: 98 })
            .unwrap();
        let bytes = sink.into_inner();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn encode_gif_round_trips() {
        let backend = RustBackend::new();
        let mut sink = Cursor::new(Vec::new());
        backend
            .encode(
                &mut sink,
                &gradient(40, 30),
                EncodeParams::Gif { palette_size: 256 },
            )
            .unwrap();
        let bytes = sink.into_inner();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Gif);
    }

    #[test]
    fn encode_gif_rejects_other_palettes() {
        let backend = RustBackend::new();
        let mut sink = Cursor::new(Vec::new());
        let result = backend.encode(
            &mut sink,
            &gradient(10, 10),
            EncodeParams::Gif { palette_size: 16 },
        );
        assert!(result.is_err());
    }
}
