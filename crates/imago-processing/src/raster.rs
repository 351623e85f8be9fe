//! Production image codec built on the `image` crate.
//!
//! Geometry work happens on the decoded `DynamicImage`; quarter-turn
//! rotations and flips use the lossless `imageops` transforms, arbitrary
//! angles go through `imageproc`. Every operation re-encodes in the source
//! format except `convert`, which selects the target encoding.

use crate::codec::{CodecError, CodecResult, ImageCodec};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, GenericImageView, ImageFormat, ImageReader, Rgba};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imago_core::transform::SUPPORTED_CONVERT_TARGETS;
use std::io::Cursor;

const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Image codec backed by the `image` and `imageproc` crates.
#[derive(Debug, Clone)]
pub struct RasterCodec {
    jpeg_quality: u8,
}

impl RasterCodec {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn decode(data: &[u8]) -> Result<(DynamicImage, ImageFormat), CodecError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| CodecError::Decode("unrecognized image format".to_string()))?;
        let img = reader
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok((img, format))
    }

    fn encode(&self, img: &DynamicImage, format: ImageFormat) -> CodecResult {
        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity(Self::encode_capacity_hint(width, height));
        let mut cursor = Cursor::new(&mut buffer);

        match format {
            // JPEG has no alpha channel and a configurable quality
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut cursor, self.jpeg_quality);
                img.to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| CodecError::Encode(e.to_string()))?;
            }
            _ => img
                .write_to(&mut cursor, format)
                .map_err(|e| CodecError::Encode(e.to_string()))?,
        }

        Ok(Bytes::from(buffer))
    }

    // Computed in usize so gigapixel images (reachable via zoom) don't
    // overflow the u32 pixel counts.
    fn encode_capacity_hint(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    fn target_format(image_type: &str) -> Result<ImageFormat, CodecError> {
        match image_type.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::WebP),
            other => Err(CodecError::UnsupportedFormat(format!(
                "{} (supported: {})",
                other,
                SUPPORTED_CONVERT_TARGETS.join(", ")
            ))),
        }
    }
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageCodec for RasterCodec {
    fn resize(&self, data: &[u8], width: u32, height: u32) -> CodecResult {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidGeometry(
                "resize dimensions must be non-zero".to_string(),
            ));
        }
        let (img, format) = Self::decode(data)?;
        let resized = img.resize_exact(width, height, imageops::FilterType::Lanczos3);
        self.encode(&resized, format)
    }

    fn rotate(&self, data: &[u8], angle: i32) -> CodecResult {
        let normalized = angle.rem_euclid(360);
        if normalized == 0 {
            // Explicit rotation by zero degrees: the stage still runs, the
            // bytes pass through unchanged.
            return Ok(Bytes::copy_from_slice(data));
        }

        let (img, format) = Self::decode(data)?;
        let rotated = match normalized {
            90 => DynamicImage::ImageRgba8(imageops::rotate90(&img.to_rgba8())),
            180 => DynamicImage::ImageRgba8(imageops::rotate180(&img.to_rgba8())),
            270 => DynamicImage::ImageRgba8(imageops::rotate270(&img.to_rgba8())),
            degrees => {
                let theta = degrees as f32 * std::f32::consts::PI / 180.0;
                DynamicImage::ImageRgba8(rotate_about_center(
                    &img.to_rgba8(),
                    theta,
                    Interpolation::Bilinear,
                    Rgba([0, 0, 0, 0]),
                ))
            }
        };
        self.encode(&rotated, format)
    }

    fn crop(&self, data: &[u8], width: u32, height: u32) -> CodecResult {
        let (img, format) = Self::decode(data)?;
        let (src_width, src_height) = img.dimensions();

        if width > src_width || height > src_height {
            return Err(CodecError::InvalidGeometry(format!(
                "crop {}x{} exceeds image dimensions {}x{}",
                width, height, src_width, src_height
            )));
        }

        // Center gravity
        let x = (src_width - width) / 2;
        let y = (src_height - height) / 2;
        let cropped = img.crop_imm(x, y, width, height);
        self.encode(&cropped, format)
    }

    fn flip(&self, data: &[u8]) -> CodecResult {
        let (img, format) = Self::decode(data)?;
        let flipped = DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()));
        self.encode(&flipped, format)
    }

    fn convert(&self, data: &[u8], image_type: &str) -> CodecResult {
        let target = Self::target_format(image_type)?;
        let (img, _) = Self::decode(data)?;
        self.encode(&img, target)
    }

    fn zoom(&self, data: &[u8], factor: u32) -> CodecResult {
        if factor == 0 {
            return Err(CodecError::InvalidGeometry(
                "zoom factor must be non-zero".to_string(),
            ));
        }
        let (img, format) = Self::decode(data)?;
        let (width, height) = img.dimensions();

        let (zoomed_width, zoomed_height) = width
            .checked_mul(factor)
            .zip(height.checked_mul(factor))
            .ok_or_else(|| {
                CodecError::InvalidGeometry(format!(
                    "zoom factor {} overflows image dimensions {}x{}",
                    factor, width, height
                ))
            })?;

        let zoomed = img.resize_exact(zoomed_width, zoomed_height, imageops::FilterType::Lanczos3);
        self.encode(&zoomed, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 50, 50, 255]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn dimensions_of(data: &[u8]) -> (u32, u32) {
        image::load_from_memory(data).unwrap().dimensions()
    }

    #[test]
    fn resize_scales_to_exact_dimensions() {
        let codec = RasterCodec::default();
        let out = codec.resize(&png_bytes(100, 100), 50, 50).unwrap();
        assert_eq!(dimensions_of(&out), (50, 50));
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn rotate_quarter_turn_swaps_dimensions() {
        let codec = RasterCodec::default();
        let out = codec.rotate(&png_bytes(4, 2), 90).unwrap();
        assert_eq!(dimensions_of(&out), (2, 4));

        let out = codec.rotate(&png_bytes(4, 2), -90).unwrap();
        assert_eq!(dimensions_of(&out), (2, 4));

        let out = codec.rotate(&png_bytes(4, 2), 180).unwrap();
        assert_eq!(dimensions_of(&out), (4, 2));
    }

    #[test]
    fn rotate_zero_passes_bytes_through() {
        let codec = RasterCodec::default();
        let src = png_bytes(4, 2);
        assert_eq!(codec.rotate(&src, 0).unwrap(), src.as_slice());
        assert_eq!(codec.rotate(&src, 360).unwrap(), src.as_slice());
    }

    #[test]
    fn rotate_arbitrary_angle_keeps_canvas() {
        let codec = RasterCodec::default();
        let out = codec.rotate(&png_bytes(10, 10), 45).unwrap();
        assert_eq!(dimensions_of(&out), (10, 10));
    }

    #[test]
    fn crop_is_center_gravity() {
        let codec = RasterCodec::default();
        let out = codec.crop(&png_bytes(100, 100), 10, 10).unwrap();
        assert_eq!(dimensions_of(&out), (10, 10));
    }

    #[test]
    fn crop_larger_than_image_is_invalid_geometry() {
        let codec = RasterCodec::default();
        let err = codec.crop(&png_bytes(10, 10), 20, 5).unwrap_err();
        assert!(matches!(err, CodecError::InvalidGeometry(_)));
    }

    #[test]
    fn flip_mirrors_horizontally() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        let mut src = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut src), ImageFormat::Png)
            .unwrap();

        let codec = RasterCodec::default();
        let out = codec.flip(&src).unwrap();
        let flipped = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(flipped.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(flipped.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn convert_changes_the_encoding() {
        let codec = RasterCodec::default();
        let out = codec.convert(&png_bytes(10, 10), "jpeg").unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);

        let out = codec.convert(&png_bytes(10, 10), "webp").unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn convert_rejects_unsupported_targets() {
        let codec = RasterCodec::default();
        for target in ["bogus", "svg", "tiff", ""] {
            let err = codec.convert(&png_bytes(4, 4), target).unwrap_err();
            assert!(
                matches!(err, CodecError::UnsupportedFormat(_)),
                "target {target:?} should be unsupported"
            );
        }
    }

    #[test]
    fn convert_accepts_every_advertised_target() {
        let codec = RasterCodec::default();
        for target in SUPPORTED_CONVERT_TARGETS {
            codec
                .convert(&png_bytes(4, 4), target)
                .unwrap_or_else(|err| panic!("target {target:?} should convert: {err}"));
        }
    }

    #[test]
    fn encode_capacity_hint_handles_gigapixel_dimensions() {
        // u32 arithmetic would overflow here; the hint must not.
        let hint = RasterCodec::encode_capacity_hint(u32::MAX, 2);
        assert_eq!(hint, u32::MAX as usize * 2 * 3);
    }

    #[test]
    fn zoom_multiplies_dimensions() {
        let codec = RasterCodec::default();
        let out = codec.zoom(&png_bytes(10, 10), 2).unwrap();
        assert_eq!(dimensions_of(&out), (20, 20));

        // Factor 1 is a valid stage that keeps the dimensions
        let out = codec.zoom(&png_bytes(10, 10), 1).unwrap();
        assert_eq!(dimensions_of(&out), (10, 10));
    }

    #[test]
    fn zoom_overflow_is_invalid_geometry() {
        let codec = RasterCodec::default();
        let err = codec.zoom(&png_bytes(10, 10), u32::MAX).unwrap_err();
        assert!(matches!(err, CodecError::InvalidGeometry(_)));
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let codec = RasterCodec::default();
        let err = codec.resize(b"not an image", 10, 10).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
