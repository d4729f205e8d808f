//! Assembling a pipeline from configuration.

use std::sync::Arc;

use tracing::{debug, info};

use rgb_everywhere_capture::{ColorExtractor, ScreenCapture};
use rgb_everywhere_controller::{ControllerLink, LinkConfig};
use rgb_everywhere_core::{AppConfig, LaunchMode, Region, Result};
use rgb_everywhere_sampler::{ChangeDetector, Sampler};

use crate::pipeline::PalettePipeline;

/// Build the pipeline for `config` on top of the given capture seams.
///
/// Regions (and the probe) are checked against the display bounds here, so
/// a misconfigured region fails at startup rather than on every tick. In
/// [`LaunchMode::Startup`] the controller is launched before returning.
pub fn build_pipeline(
    config: &AppConfig,
    screen: Arc<dyn ScreenCapture>,
    extractor: Arc<dyn ColorExtractor>,
) -> Result<PalettePipeline> {
    let bounds = screen.display_bounds()?;
    info!("Sampling display {} ({})", config.display_index, bounds);

    let regions: Vec<Region> = if config.sampling.regions.is_empty() {
        vec![bounds.full_region()?]
    } else {
        config.sampling.regions.clone()
    };
    for region in &regions {
        region.ensure_within(&bounds)?;
    }

    let detection = &config.change_detection;
    let detector = if detection.enabled {
        let probe = match detection.probe {
            Some(probe) => probe,
            None => bounds.centered_square(detection.probe_size)?,
        };
        probe.ensure_within(&bounds)?;
        info!(
            "Change detection on probe {} (threshold {:.1})",
            probe, detection.threshold
        );
        Some(ChangeDetector::new(probe, detection.threshold))
    } else {
        info!("Change detection disabled, sampling every tick");
        None
    };

    let sampler = Sampler::new(screen, extractor, config.sampling.colors_per_region);
    debug!(
        "Sampling {} region(s), {} color(s) each",
        regions.len(),
        sampler.colors_per_region()
    );

    let mut link = ControllerLink::new(LinkConfig::from_settings(
        config.controller_executable_path.clone(),
        &config.controller,
    ));
    if config.controller.launch == LaunchMode::Startup {
        link.start(None)?;
    }

    Ok(PalettePipeline::new(
        sampler,
        detector,
        regions,
        link,
        config.controller.on_session_lost,
        config.verbose,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb_everywhere_capture::KMeansExtractor;
    use rgb_everywhere_core::{ColorSample, Error};
    use rgb_everywhere_sampler::testing::ScriptedScreen;

    fn config() -> AppConfig {
        AppConfig {
            controller_executable_path: "/nonexistent/controller".to_string(),
            ..Default::default()
        }
    }

    fn build(config: &AppConfig) -> Result<PalettePipeline> {
        build_pipeline(
            config,
            Arc::new(ScriptedScreen::new(200, 100, ColorSample::BLACK)),
            Arc::new(KMeansExtractor::new()),
        )
    }

    #[test]
    fn test_defaults_sample_whole_display() {
        let pipeline = build(&config()).unwrap();
        assert_eq!(pipeline.regions(), &[Region::new(0, 0, 200, 100).unwrap()]);

        let detector = pipeline.detector().unwrap();
        assert_eq!(*detector.probe(), Region::new(68, 18, 64, 64).unwrap());
        assert_eq!(detector.threshold(), 51.0);
        assert!(!pipeline.link().has_session());
    }

    #[test]
    fn test_configured_regions_keep_order() {
        let mut config = config();
        config.sampling.regions = vec![
            Region::new(100, 0, 100, 100).unwrap(),
            Region::new(0, 0, 100, 100).unwrap(),
        ];
        let pipeline = build(&config).unwrap();
        assert_eq!(pipeline.regions(), config.sampling.regions.as_slice());
    }

    #[test]
    fn test_region_outside_display_fails() {
        let mut config = config();
        config.sampling.regions = vec![Region::new(150, 0, 100, 100).unwrap()];
        assert!(matches!(
            build(&config),
            Err(Error::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_probe_outside_display_fails() {
        let mut config = config();
        config.change_detection.probe = Some(Region::new(190, 90, 20, 20).unwrap());
        assert!(matches!(
            build(&config),
            Err(Error::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_detection_disabled() {
        let mut config = config();
        config.change_detection.enabled = false;
        let pipeline = build(&config).unwrap();
        assert!(pipeline.detector().is_none());
    }

    #[test]
    fn test_startup_launch_failure() {
        let mut config = config();
        config.controller.launch = LaunchMode::Startup;
        assert!(matches!(build(&config), Err(Error::Launch { .. })));
    }
}
