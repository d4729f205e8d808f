//! Region sampling: capture, extract, concatenate, validate.

use std::sync::Arc;

use tracing::{debug, warn};

use rgb_everywhere_capture::{ColorExtractor, ScreenCapture};
use rgb_everywhere_core::{ColorSample, Error, Palette, Region, Result};

/// Turns a list of regions into a palette of exactly
/// `colors_per_region × regions.len()` colors.
#[derive(Clone)]
pub struct Sampler {
    screen: Arc<dyn ScreenCapture>,
    extractor: Arc<dyn ColorExtractor>,
    colors_per_region: usize,
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("colors_per_region", &self.colors_per_region)
            .finish_non_exhaustive()
    }
}

impl Sampler {
    /// Create a new sampler.
    pub fn new(
        screen: Arc<dyn ScreenCapture>,
        extractor: Arc<dyn ColorExtractor>,
        colors_per_region: usize,
    ) -> Self {
        Self {
            screen,
            extractor,
            colors_per_region,
        }
    }

    /// Clusters requested per region.
    pub fn colors_per_region(&self) -> usize {
        self.colors_per_region
    }

    /// Palette length (K) for the given number of regions.
    pub fn expected_len(&self, region_count: usize) -> usize {
        self.colors_per_region * region_count
    }

    /// Sample every region and build a palette.
    ///
    /// Regions are captured one after another and their colors concatenated
    /// in declaration order. A region that fails to capture or extract is
    /// logged and contributes no colors, so the result then fails the shape
    /// check with [`Error::ShapeMismatch`] instead of forwarding a short
    /// palette.
    pub fn sample(&self, regions: &[Region]) -> Result<Palette> {
        let expected = self.expected_len(regions.len());
        let mut colors = Vec::with_capacity(expected);

        for region in regions {
            match self.extract_region(region, self.colors_per_region) {
                Ok(extracted) => {
                    debug!("Region {}: {} color(s)", region, extracted.len());
                    colors.extend(extracted);
                }
                Err(e) => {
                    warn!("Skipping region {}: {}", region, e);
                }
            }
        }

        Palette::new(colors, expected)
    }

    /// Capture a region and return its single most dominant color.
    pub fn dominant_color(&self, region: &Region) -> Result<ColorSample> {
        self.extract_region(region, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Extraction(format!("no color found in region {region}")))
    }

    fn extract_region(&self, region: &Region, count: usize) -> Result<Vec<ColorSample>> {
        // The buffer is dropped at the end of this call.
        let buffer = self.screen.capture(region)?;
        self.extractor.extract_dominant(&buffer, count)
    }
}
