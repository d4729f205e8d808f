//! Scripted doubles for the capture seams.
//!
//! Used by the tests and benchmarks of this crate and of the binary; they
//! let a test paint a synthetic display and make chosen regions fail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rgb_everywhere_capture::{ColorExtractor, PixelBuffer, ScreenCapture};
use rgb_everywhere_core::{ColorSample, DisplayBounds, Error, Region, Result};

/// In-memory display that tests paint on.
///
/// Captures copy the requested rectangle out of the painted frame. Regions
/// registered with [`fail`](Self::fail) return [`Error::Capture`] until
/// [`heal`](Self::heal)ed.
#[derive(Debug)]
pub struct ScriptedScreen {
    bounds: DisplayBounds,
    frame: Mutex<Vec<ColorSample>>,
    failing: Mutex<Vec<Region>>,
    captures: AtomicUsize,
}

impl ScriptedScreen {
    /// A display of the given size filled with `background`.
    pub fn new(width: u32, height: u32, background: ColorSample) -> Self {
        Self {
            bounds: DisplayBounds::new(width, height),
            frame: Mutex::new(vec![background; width as usize * height as usize]),
            failing: Mutex::new(Vec::new()),
            captures: AtomicUsize::new(0),
        }
    }

    /// Fill a region with one color (clipped to the display).
    pub fn paint(&self, region: &Region, color: ColorSample) {
        self.paint_with(region, |_, _| color);
    }

    /// Fill the whole display with one color.
    pub fn fill(&self, color: ColorSample) {
        let mut frame = self.frame.lock().unwrap();
        frame.iter_mut().for_each(|c| *c = color);
    }

    /// Fill a region with equal-width vertical stripes, left to right.
    pub fn paint_stripes(&self, region: &Region, colors: &[ColorSample]) {
        if colors.is_empty() {
            return;
        }
        let stripe = (region.width() as usize).div_ceil(colors.len()).max(1);
        self.paint_with(region, |dx, _| colors[(dx as usize / stripe).min(colors.len() - 1)]);
    }

    /// Make captures of exactly this region fail.
    pub fn fail(&self, region: &Region) {
        self.failing.lock().unwrap().push(*region);
    }

    /// Undo [`fail`](Self::fail) for this region.
    pub fn heal(&self, region: &Region) {
        self.failing.lock().unwrap().retain(|r| r != region);
    }

    /// Number of capture calls so far, failed ones included.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    fn paint_with<F>(&self, region: &Region, mut color_at: F)
    where
        F: FnMut(u32, u32) -> ColorSample,
    {
        let mut frame = self.frame.lock().unwrap();
        let right = region.right().min(self.bounds.width);
        let bottom = region.bottom().min(self.bounds.height);
        for y in region.y()..bottom {
            for x in region.x()..right {
                let index = y as usize * self.bounds.width as usize + x as usize;
                frame[index] = color_at(x - region.x(), y - region.y());
            }
        }
    }
}

impl ScreenCapture for ScriptedScreen {
    fn display_bounds(&self) -> Result<DisplayBounds> {
        Ok(self.bounds)
    }

    fn capture(&self, region: &Region) -> Result<PixelBuffer> {
        self.captures.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(region) {
            return Err(Error::Capture {
                region: *region,
                reason: "scripted failure".to_string(),
            });
        }
        region.ensure_within(&self.bounds)?;

        let frame = self.frame.lock().unwrap();
        let width = self.bounds.width as usize;
        Ok(PixelBuffer::from_fn(region.width(), region.height(), |dx, dy| {
            let x = (region.x() + dx) as usize;
            let y = (region.y() + dy) as usize;
            frame[y * width + x]
        }))
    }
}

/// Extractor that ignores its input and returns a fixed list.
#[derive(Debug, Clone)]
pub struct FixedExtractor {
    colors: Vec<ColorSample>,
}

impl FixedExtractor {
    /// Always return `colors`, whatever count is requested.
    pub fn new(colors: Vec<ColorSample>) -> Self {
        Self { colors }
    }
}

impl ColorExtractor for FixedExtractor {
    fn extract_dominant(&self, _buffer: &PixelBuffer, _count: usize) -> Result<Vec<ColorSample>> {
        Ok(self.colors.clone())
    }
}
