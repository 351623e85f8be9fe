//! Transformation request model
//!
//! A `TransformRequest` is a sparse container holding at most one
//! configuration per stage kind. Presence is the sole selector: an absent
//! field skips the stage, a present field runs it with exactly the given
//! parameters. The request carries no ordering information; the canonical
//! stage order is owned by the pipeline in `imago-processing`.
//!
//! Validation is a pure check that reports **every** offending field in one
//! structured error, not just the first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convert targets the codec can encode. `svg` is accepted as a source format
/// only; requesting it (or anything else outside this set) as a target is a
/// convert stage failure, reported by the codec rather than here.
pub const SUPPORTED_CONVERT_TARGETS: [&str; 4] = ["png", "jpeg", "jpg", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateSpec {
    /// Degrees clockwise. Any value is accepted once the field is present;
    /// angle 0 is a valid explicit rotation-by-zero stage, still invoked.
    pub angle: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSpec {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSpec {
    pub image_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomSpec {
    pub factor: u32,
}

/// Sparse set of optional stage configurations submitted by a caller.
///
/// `flip` is a presence-only stage: the wire encoding is a boolean where
/// `true` selects the stage and `false` behaves exactly like absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<RotateSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropSpec>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomSpec>,
}

impl TransformRequest {
    /// True when no stage is selected. An empty request is valid: the
    /// pipeline treats it as the identity transformation.
    pub fn is_identity(&self) -> bool {
        self.resize.is_none()
            && self.rotate.is_none()
            && self.crop.is_none()
            && !self.flip
            && self.convert.is_none()
            && self.zoom.is_none()
    }

    /// Validate every present stage configuration, collecting all violations.
    ///
    /// Presence with a zero-valued parameter is a validation error, never a
    /// skip signal. Rotation angles are unconstrained once present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if let Some(resize) = &self.resize {
            if resize.width == 0 {
                violations.push(FieldViolation::new(
                    "resize.width",
                    "must be greater than zero",
                ));
            }
            if resize.height == 0 {
                violations.push(FieldViolation::new(
                    "resize.height",
                    "must be greater than zero",
                ));
            }
        }

        if let Some(crop) = &self.crop {
            if crop.width == 0 {
                violations.push(FieldViolation::new(
                    "crop.width",
                    "must be greater than zero",
                ));
            }
            if crop.height == 0 {
                violations.push(FieldViolation::new(
                    "crop.height",
                    "must be greater than zero",
                ));
            }
        }

        if let Some(convert) = &self.convert {
            if convert.image_type.trim().is_empty() {
                violations.push(FieldViolation::new(
                    "convert.image_type",
                    "must not be empty",
                ));
            }
        }

        if let Some(zoom) = &self.zoom {
            if zoom.factor == 0 {
                violations.push(FieldViolation::new(
                    "zoom.factor",
                    "must be greater than zero",
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

/// A single offending field in a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Structured validation failure enumerating every offending field.
#[derive(Debug, thiserror::Error)]
#[error("invalid transformation request: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
