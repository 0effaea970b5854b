/// Color search and palette extraction
///
/// - `ColorMatcher` finds the pixel nearest to a target color
/// - `dominant_color` clusters an image into its main colors
pub mod dominant;
pub mod finder;
pub mod types;

pub use dominant::dominant_color;
pub use finder::{ColorConfig, ColorMatcher};
pub use types::{Color, HlsColor, IntoColor};
