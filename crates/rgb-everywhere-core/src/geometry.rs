//! Geometry types for display coordinates and sampling regions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Size of a display in pixels.
///
/// Regions are expressed relative to the display's top-left corner, so the
/// origin is always `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayBounds {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl DisplayBounds {
    /// Create new display bounds.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The region covering the whole display.
    pub fn full_region(&self) -> Result<Region> {
        Region::new(0, 0, self.width, self.height)
    }

    /// A square of side `size` centred on the display.
    ///
    /// The square is shrunk to fit if the display is smaller than `size`.
    pub fn centered_square(&self, size: u32) -> Result<Region> {
        let side = size.min(self.width).min(self.height);
        let x = (self.width - side) / 2;
        let y = (self.height - side) / 2;
        Region::new(x, y, side, side)
    }
}

impl fmt::Display for DisplayBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangular area of a display to sample.
///
/// Width and height are always non-zero; construct through [`Region::new`]
/// or deserialize, both of which validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRegion", into = "RawRegion")]
pub struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    /// Create a new region.
    ///
    /// Fails with [`Error::InvalidRegion`] if either side is zero or the
    /// region would extend past `u32::MAX`.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        let overflows = x.checked_add(width).is_none() || y.checked_add(height).is_none();
        if width == 0 || height == 0 || overflows {
            return Err(Error::InvalidRegion {
                x,
                y,
                width,
                height,
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Left edge.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Top edge.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// One past the right-most column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom-most row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Check if the region lies entirely on the display.
    pub fn fits_within(&self, display: &DisplayBounds) -> bool {
        self.right() <= display.width && self.bottom() <= display.height
    }

    /// Like [`fits_within`](Self::fits_within) but returns an error naming both rectangles.
    pub fn ensure_within(&self, display: &DisplayBounds) -> Result<()> {
        if self.fits_within(display) {
            Ok(())
        } else {
            Err(Error::RegionOutOfBounds {
                region: *self,
                display: *display,
            })
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Unvalidated wire form of a [`Region`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl TryFrom<RawRegion> for Region {
    type Error = Error;

    fn try_from(raw: RawRegion) -> Result<Self> {
        Region::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl From<Region> for RawRegion {
    fn from(region: Region) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }
}
