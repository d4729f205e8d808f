//! Pixel buffers for captured screen regions.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

use rgb_everywhere_core::{ColorSample, DisplayBounds, Region, Result};

/// 2-D grid of RGB samples for one captured region.
///
/// Buffers are produced by a [`ScreenCapture`](crate::ScreenCapture) and
/// consumed within a single sampling pass; nothing holds on to them
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    /// Flatten an RGBA frame over an opaque white backdrop.
    pub fn from_rgba(rgba: &RgbaImage) -> Self {
        let image = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
        });
        Self { image }
    }

    /// A buffer of a single color.
    pub fn filled(width: u32, height: u32, color: ColorSample) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    /// Build a buffer by evaluating `f` for every `(x, y)`.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> ColorSample,
    {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb(f(x, y).channels()));
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Check if the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Color at `(x, y)`, or None outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<ColorSample> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(ColorSample::from(self.image.get_pixel(x, y).0))
    }

    /// All pixels in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = ColorSample> + '_ {
        self.image.pixels().map(|p| ColorSample::from(p.0))
    }

    /// Cut `region` out of an RGBA frame and flatten only that part.
    ///
    /// Only the cropped pixels are converted, so a small region costs the
    /// same whatever the size of the frame it comes from.
    pub fn crop_rgba(frame: &RgbaImage, region: &Region) -> Result<PixelBuffer> {
        region.ensure_within(&DisplayBounds::new(frame.width(), frame.height()))?;
        let view = imageops::crop_imm(
            frame,
            region.x(),
            region.y(),
            region.width(),
            region.height(),
        );
        Ok(Self::from_rgba(&view.to_image()))
    }

    /// Shrink so that the longest side is at most `max_dimension`.
    ///
    /// Uses nearest-neighbour sampling so no new colors are invented.
    /// Buffers already small enough are returned unchanged.
    pub fn downscale(&self, max_dimension: u32) -> PixelBuffer {
        let (width, height) = (self.width(), self.height());
        let longest = width.max(height);
        if max_dimension == 0 || longest <= max_dimension {
            return self.clone();
        }

        let scale = f64::from(max_dimension) / f64::from(longest);
        let new_width = ((f64::from(width) * scale).round() as u32).max(1);
        let new_height = ((f64::from(height) * scale).round() as u32).max(1);

        Self {
            image: imageops::resize(&self.image, new_width, new_height, FilterType::Nearest),
        }
    }
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = u32::from(channel);
    let a = u32::from(alpha);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}
