//! Screen vision primitives for screenshot-driven automation.
//!
//! - [`template_matching`]: locate template images, optionally masked or
//!   color verified
//! - [`color`]: find pixels by color and extract dominant colors
//! - [`ocr`]: run an injected text recognizer with padding and coordinate mapping
//!
//! All operations are synchronous and take their inputs as [`ImageSource`].

pub mod color;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod ocr;
pub mod template_matching;

pub use color::{Color, ColorConfig, ColorMatcher, IntoColor, dominant_color};
pub use debug::{DebugReporter, LogReporter, NoopReporter};
pub use error::{VisionError, VisionResult};
pub use geometry::{Point, Rect, Size, bounding_box};
pub use loader::ImageSource;
pub use ocr::{Ocr, OcrConfig, OcrResult, OcrResultList, RecognizedText, TextPattern, TextRecognizer};
pub use template_matching::{
    CropResult, MatchConfig, MatchOptions, MatchResult, MultiMatchResult, TemplateMatcher,
};
