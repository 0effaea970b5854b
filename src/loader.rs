//! Resolution of template and target inputs into pixel buffers

use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};

use crate::error::{VisionError, VisionResult};
use crate::geometry::Rect;

/// Default level above which a mask pixel counts as "on"
pub const MASK_LEVEL: u8 = 127;

/// An image given either as a file on disk or as pixels already in memory
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Pixels(DynamicImage),
}

impl ImageSource {
    pub fn path(path: impl AsRef<Path>) -> Self {
        ImageSource::Path(path.as_ref().to_path_buf())
    }

    /// Wrap a raw BGR buffer (OpenCV channel order)
    pub fn from_bgr(width: u32, height: u32, bytes: &[u8]) -> VisionResult<Self> {
        let image = swap_red_blue::<3>(width, height, bytes)
            .and_then(|raw| RgbImage::from_raw(width, height, raw))
            .ok_or_else(|| {
                VisionError::invalid_input(format!(
                    "BGR buffer of {} bytes does not hold a {width}x{height} image",
                    bytes.len()
                ))
            })?;
        Ok(ImageSource::Pixels(DynamicImage::ImageRgb8(image)))
    }

    /// Wrap a raw BGRA buffer (OpenCV channel order)
    pub fn from_bgra(width: u32, height: u32, bytes: &[u8]) -> VisionResult<Self> {
        let image = swap_red_blue::<4>(width, height, bytes)
            .and_then(|raw| RgbaImage::from_raw(width, height, raw))
            .ok_or_else(|| {
                VisionError::invalid_input(format!(
                    "BGRA buffer of {} bytes does not hold a {width}x{height} image",
                    bytes.len()
                ))
            })?;
        Ok(ImageSource::Pixels(DynamicImage::ImageRgba8(image)))
    }

    /// Short name used in log lines and not-found errors
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

fn swap_red_blue<const N: usize>(width: u32, height: u32, bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.len() != width as usize * height as usize * N {
        return None;
    }
    let mut raw = bytes.to_vec();
    for px in raw.chunks_exact_mut(N) {
        px.swap(0, 2);
    }
    Some(raw)
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Pixels(img) => write!(f, "<pixel buffer {}x{}>", img.width(), img.height()),
        }
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        ImageSource::Pixels(image)
    }
}

impl From<RgbImage> for ImageSource {
    fn from(image: RgbImage) -> Self {
        ImageSource::Pixels(DynamicImage::ImageRgb8(image))
    }
}

impl From<RgbaImage> for ImageSource {
    fn from(image: RgbaImage) -> Self {
        ImageSource::Pixels(DynamicImage::ImageRgba8(image))
    }
}

impl From<GrayImage> for ImageSource {
    fn from(image: GrayImage) -> Self {
        ImageSource::Pixels(DynamicImage::ImageLuma8(image))
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

/// Decode (or borrow-clone) the source into a `DynamicImage`
pub fn load_image(source: &ImageSource) -> VisionResult<DynamicImage> {
    match source {
        ImageSource::Path(path) => image::open(path).map_err(|source| VisionError::ImageLoad {
            path: path.clone(),
            source,
        }),
        ImageSource::Pixels(img) => Ok(img.clone()),
    }
}

pub fn load_rgb(source: &ImageSource) -> VisionResult<RgbImage> {
    match source {
        ImageSource::Pixels(DynamicImage::ImageRgb8(img)) => Ok(img.clone()),
        _ => Ok(load_image(source)?.to_rgb8()),
    }
}

pub fn load_rgba(source: &ImageSource) -> VisionResult<RgbaImage> {
    Ok(load_image(source)?.to_rgba8())
}

/// Load a mask image and binarize it, luma above `level` is "on"
pub fn load_mask(source: &ImageSource, level: u8) -> VisionResult<GrayImage> {
    Ok(binarize(&load_image(source)?.to_luma8(), level))
}

/// Binary mask derived from the alpha channel
pub fn alpha_mask(image: &RgbaImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[3] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

pub fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Clip `rect` to the image and validate it covers at least one pixel
pub fn resolve_rect(rect: Rect, image_width: u32, image_height: u32) -> VisionResult<Rect> {
    if rect.is_empty() {
        return Err(VisionError::InvalidRect { rect });
    }
    rect.clip_to(image_width, image_height)
        .ok_or(VisionError::InvalidRect { rect })
}

/// Copy out the part of `image` covered by `rect`
pub fn crop_rect(image: &RgbImage, rect: Rect) -> VisionResult<RgbImage> {
    let clipped = resolve_rect(rect, image.width(), image.height())?;
    Ok(image::imageops::crop_imm(
        image,
        clipped.x as u32,
        clipped.y as u32,
        clipped.width,
        clipped.height,
    )
    .to_image())
}

/// Crop by fractions of the image size, e.g. `(0.0, 0.5, 1.0, 1.0)` is the lower half
pub fn crop_ratio(image: &RgbImage, x1: f32, y1: f32, x2: f32, y2: f32) -> VisionResult<RgbImage> {
    let (w, h) = image.dimensions();
    let x1_px = (w as f32 * x1) as i32;
    let y1_px = (h as f32 * y1) as i32;
    let x2_px = (w as f32 * x2) as i32;
    let y2_px = (h as f32 * y2) as i32;
    let rect = Rect::new(
        x1_px,
        y1_px,
        (x2_px - x1_px).max(0) as u32,
        (y2_px - y1_px).max(0) as u32,
    );
    crop_rect(image, rect)
}
