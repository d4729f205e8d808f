//! Color and palette types.

use std::fmt;

use palette::{IntoColor, Lab, Srgb};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single RGB color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ColorSample {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl ColorSample {
    /// Opaque white, used as the backdrop when flattening alpha.
    pub const WHITE: ColorSample = ColorSample::new(255, 255, 255);

    /// Opaque black.
    pub const BLACK: ColorSample = ColorSample::new(0, 0, 0);

    /// Create a new color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in `[r, g, b]` order.
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Straight-line distance in RGB space (0 to ~441.7).
    pub fn euclidean_distance(&self, other: &ColorSample) -> f32 {
        let dr = f32::from(self.r) - f32::from(other.r);
        let dg = f32::from(self.g) - f32::from(other.g);
        let db = f32::from(self.b) - f32::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// CIE76 ΔE: distance in CIELAB space.
    ///
    /// Roughly 0 for identical colors, 100 between black and white; a
    /// difference around 2 is barely noticeable.
    pub fn perceptual_distance(&self, other: &ColorSample) -> f32 {
        let lhs = self.to_lab();
        let rhs = other.to_lab();
        let dl = lhs.l - rhs.l;
        let da = lhs.a - rhs.a;
        let db = lhs.b - rhs.b;
        (dl * dl + da * da + db * db).sqrt()
    }

    fn to_lab(self) -> Lab {
        let rgb: Srgb<f32> = Srgb::new(self.r, self.g, self.b).into_format();
        rgb.into_color()
    }
}

impl From<[u8; 3]> for ColorSample {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Ordered list of exactly K colors, ready to be forwarded to the controller.
///
/// The only way to build one is [`Palette::new`], which rejects any other
/// length, so a `Palette` in hand always has the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<ColorSample>,
}

impl Palette {
    /// Validate `colors` against the expected length.
    pub fn new(colors: Vec<ColorSample>, expected: usize) -> Result<Self> {
        if colors.len() != expected || expected == 0 {
            return Err(Error::ShapeMismatch {
                expected,
                actual: colors.len(),
            });
        }
        Ok(Self { colors })
    }

    /// The colors in order.
    pub fn colors(&self) -> &[ColorSample] {
        &self.colors
    }

    /// Number of colors (K).
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; present for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Flattened channel values, `r, g, b` for each color in order.
    pub fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.colors.iter().flat_map(|c| c.channels())
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, color) in self.colors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {} {}", color.r, color.g, color.b)?;
        }
        write!(f, "]")
    }
}
