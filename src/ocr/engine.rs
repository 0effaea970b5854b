use image::GrayImage;

use crate::error::VisionResult;

/// Raw output of a text recognizer for one detected line
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    /// Detection polygon in the coordinates of the image given to the engine,
    /// usually four corners but not necessarily axis-aligned
    pub corners: Vec<(f32, f32)>,
    pub text: String,
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(corners: Vec<(f32, f32)>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            corners,
            text: text.into(),
            confidence,
        }
    }
}

/// A text detection and recognition backend.
///
/// Implementations must be callable from several threads. An engine whose
/// runtime is not thread-safe has to serialize calls internally, for example
/// behind a `Mutex`.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> VisionResult<Vec<RecognizedText>>;
}
