use std::path::PathBuf;

use image::RgbImage;
use thiserror::Error;

use crate::geometry::Rect;

/// A specialized `Result` type for matching operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// The error type for all matching and recognition operations.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Template not found: {template}")]
    TemplateNotFound {
        template: String,
        template_image: Box<RgbImage>,
        image: Box<RgbImage>,
    },

    #[error("Expected text not found: {pattern}")]
    TextNotFound {
        pattern: String,
        image: Box<RgbImage>,
    },

    #[error(
        "Invalid color {input:?}: {reason}. Expected a hex string '#RRGGBB' or an (r, g, b) triple with channels in 0..=255"
    )]
    InvalidColor { input: String, reason: String },

    #[error("Invalid search rect {rect}: rect must have a non-zero area inside the image")]
    InvalidRect { rect: Rect },

    #[error("Invalid input: {description}")]
    InvalidInput { description: String },

    #[error("A mask and transparent=true cannot be used in the same match call")]
    MaskConflict,

    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Text recognizer failed: {description}")]
    Recognizer { description: String },
}

impl VisionError {
    /// Check if this error is one of the "nothing found" conditions raised by `expect`
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VisionError::TemplateNotFound { .. } | VisionError::TextNotFound { .. }
        )
    }

    /// The source image carried by a not-found error, if any
    pub fn source_image(&self) -> Option<&RgbImage> {
        match self {
            VisionError::TemplateNotFound { image, .. } | VisionError::TextNotFound { image, .. } => {
                Some(image)
            }
            _ => None,
        }
    }

    /// The template pixels of a `TemplateNotFound` error
    pub fn template_image(&self) -> Option<&RgbImage> {
        match self {
            VisionError::TemplateNotFound { template_image, .. } => Some(template_image),
            _ => None,
        }
    }

    pub(crate) fn invalid_input(description: impl Into<String>) -> Self {
        VisionError::InvalidInput {
            description: description.into(),
        }
    }

    pub(crate) fn invalid_color(input: impl Into<String>, reason: impl Into<String>) -> Self {
        VisionError::InvalidColor {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
