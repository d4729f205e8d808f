//! Screen capture seam and the `xcap` backend.

use rgb_everywhere_core::{DisplayBounds, Region, Result};

use crate::PixelBuffer;

/// Source of screen pixels for one display.
///
/// Implementations must be cheap to share between the sampler and the
/// change detector; both only ever call through `&self`.
pub trait ScreenCapture: Send + Sync {
    /// Size of the display that regions are relative to.
    fn display_bounds(&self) -> Result<DisplayBounds>;

    /// Capture the pixels of one region.
    ///
    /// Fails with [`Error::Capture`](rgb_everywhere_core::Error::Capture) if
    /// the backend cannot produce a frame, or
    /// [`Error::RegionOutOfBounds`](rgb_everywhere_core::Error::RegionOutOfBounds)
    /// if the region does not fit on the display.
    fn capture(&self, region: &Region) -> Result<PixelBuffer>;
}

#[cfg(feature = "xcap")]
pub use self::xcap_backend::XcapScreen;

#[cfg(feature = "xcap")]
mod xcap_backend {
    use image::RgbaImage;
    use tracing::{debug, error};
    use xcap::Monitor;

    use rgb_everywhere_core::{DisplayBounds, Error, Region, Result};

    use super::ScreenCapture;
    use crate::PixelBuffer;

    /// Captures a display through the `xcap` crate.
    ///
    /// xcap only grabs whole monitors, so every capture takes a full frame
    /// and crops the raw RGBA image before any per-pixel work. The monitor
    /// is looked up on each capture, so an unplugged display surfaces as a
    /// capture error rather than a stale handle.
    #[derive(Debug, Clone)]
    pub struct XcapScreen {
        display_index: usize,
    }

    impl XcapScreen {
        /// Capture from the display at `display_index` (enumeration order).
        pub fn new(display_index: usize) -> Self {
            Self { display_index }
        }

        fn monitor(&self) -> Result<Monitor> {
            let monitors = Monitor::all().map_err(|e| {
                error!("Failed to enumerate monitors: {}", e);
                Error::Other(format!("Failed to enumerate monitors: {e}"))
            })?;

            debug!("Found {} monitor(s)", monitors.len());
            monitors
                .into_iter()
                .nth(self.display_index)
                .ok_or(Error::DisplayNotFound(self.display_index))
        }

        fn frame(&self) -> std::result::Result<RgbaImage, String> {
            let monitor = self.monitor().map_err(|e| e.to_string())?;
            monitor.capture_image().map_err(|e| e.to_string())
        }
    }

    impl ScreenCapture for XcapScreen {
        // Read from a real frame so the bounds are in the same (physical)
        // pixel units that capture() crops in.
        fn display_bounds(&self) -> Result<DisplayBounds> {
            let monitor = self.monitor()?;
            let image = monitor
                .capture_image()
                .map_err(|e| Error::Other(format!("Screen capture failed: {e}")))?;
            Ok(DisplayBounds::new(image.width(), image.height()))
        }

        fn capture(&self, region: &Region) -> Result<PixelBuffer> {
            let frame = self.frame().map_err(|reason| Error::Capture {
                region: *region,
                reason,
            })?;
            PixelBuffer::crop_rgba(&frame, region)
        }
    }
}
