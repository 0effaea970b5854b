/// Text recognition on top of a pluggable engine
///
/// This module provides:
/// - The `TextRecognizer` trait engines implement
/// - `Ocr`, which pads small inputs and maps results back to source coordinates
/// - Text patterns and result helpers used to pick results
pub mod engine;
pub mod pattern;
pub mod recognizer;
pub mod types;


pub use engine::{RecognizedText, TextRecognizer};
pub use pattern::TextPattern;
pub use recognizer::{Ocr, OcrConfig};
pub use types::{OcrResult, OcrResultList};
