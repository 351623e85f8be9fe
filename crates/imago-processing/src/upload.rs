//! Upload validation
//!
//! Size and content-type policy applied to incoming image uploads before
//! they reach storage. The content type is sniffed from the bytes; a claimed
//! Content-Type that disagrees with the sniffed one is rejected to prevent
//! spoofed uploads.

use image::ImageFormat;
use imago_core::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("claimed content type {claimed} does not match detected {detected}")]
    ContentTypeMismatch { claimed: String, detected: String },

    #[error("empty file")]
    EmptyFile,

    #[error("unrecognized image data")]
    UnrecognizedImage,
}

impl From<UploadError> for imago_core::AppError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        match err {
            UploadError::FileTooLarge { .. } => imago_core::AppError::PayloadTooLarge(message),
            _ => imago_core::AppError::BadRequest(message),
        }
    }
}

/// Sniff the content type of encoded image bytes.
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(data).ok()?;
    Some(mime_for(format))
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Upload validation policy
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    /// Validate an upload, returning the sniffed content type on success.
    ///
    /// `claimed_content_type` is the client-supplied Content-Type, if any;
    /// it must agree with what the bytes actually are.
    pub fn check(
        &self,
        data: &[u8],
        claimed_content_type: Option<&str>,
    ) -> Result<&'static str, UploadError> {
        if data.is_empty() {
            return Err(UploadError::EmptyFile);
        }
        if data.len() > self.max_file_size {
            return Err(UploadError::FileTooLarge {
                size: data.len(),
                max: self.max_file_size,
            });
        }

        let detected = sniff_content_type(data).ok_or(UploadError::UnrecognizedImage)?;

        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed == detected)
        {
            return Err(UploadError::InvalidContentType {
                content_type: detected.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        if let Some(claimed) = claimed_content_type {
            let claimed_normalized = claimed
                .split(';')
                .next()
                .unwrap_or(claimed)
                .trim()
                .to_ascii_lowercase();
            if !claimed_normalized.is_empty()
                && claimed_normalized != "application/octet-stream"
                && claimed_normalized != detected
            {
                return Err(UploadError::ContentTypeMismatch {
                    claimed: claimed_normalized,
                    detected: detected.to_string(),
                });
            }
        }

        Ok(detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_fixture() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn policy() -> UploadPolicy {
        UploadPolicy::new(
            1024 * 1024,
            vec!["image/png".to_string(), "image/jpeg".to_string()],
        )
    }

    #[test]
    fn valid_png_passes_and_reports_sniffed_type() {
        let detected = policy().check(&png_fixture(), Some("image/png")).unwrap();
        assert_eq!(detected, "image/png");
    }

    #[test]
    fn claimed_type_is_optional() {
        assert_eq!(policy().check(&png_fixture(), None).unwrap(), "image/png");
    }

    #[test]
    fn mismatched_claimed_type_is_rejected() {
        let err = policy()
            .check(&png_fixture(), Some("image/jpeg"))
            .unwrap_err();
        assert!(matches!(err, UploadError::ContentTypeMismatch { .. }));
    }

    #[test]
    fn disallowed_detected_type_is_rejected() {
        let strict = UploadPolicy::new(1024 * 1024, vec!["image/jpeg".to_string()]);
        let err = strict.check(&png_fixture(), None).unwrap_err();
        assert!(matches!(err, UploadError::InvalidContentType { .. }));
    }

    #[test]
    fn oversized_uploads_are_rejected() {
        let tiny = UploadPolicy::new(8, vec!["image/png".to_string()]);
        let err = tiny.check(&png_fixture(), None).unwrap_err();
        assert!(matches!(err, UploadError::FileTooLarge { .. }));
    }

    #[test]
    fn garbage_and_empty_uploads_are_rejected() {
        assert!(matches!(
            policy().check(b"", None),
            Err(UploadError::EmptyFile)
        ));
        assert!(matches!(
            policy().check(b"plainly not an image", None),
            Err(UploadError::UnrecognizedImage)
        ));
    }
}
