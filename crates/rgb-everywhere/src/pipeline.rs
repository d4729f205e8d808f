//! The per-tick palette pass: probe, sample, deliver.

use tracing::{debug, error, info, warn};

use rgb_everywhere_controller::ControllerLink;
use rgb_everywhere_core::{Error, LaunchMode, Palette, Region, SessionLostPolicy};
use rgb_everywhere_sampler::{ChangeDetector, Sampler};

use crate::scheduler::{ExitReason, Pass, PassOutcome};

/// Single owner of everything a pass touches.
#[derive(Debug)]
pub struct PalettePipeline {
    sampler: Sampler,
    detector: Option<ChangeDetector>,
    regions: Vec<Region>,
    link: ControllerLink,
    policy: SessionLostPolicy,
    verbose: bool,
    degraded: bool,
}

impl PalettePipeline {
    /// Assemble a pipeline. `detector` is `None` when change detection is
    /// disabled.
    pub fn new(
        sampler: Sampler,
        detector: Option<ChangeDetector>,
        regions: Vec<Region>,
        link: ControllerLink,
        policy: SessionLostPolicy,
        verbose: bool,
    ) -> Self {
        Self {
            sampler,
            detector,
            regions,
            link,
            policy,
            verbose,
            degraded: false,
        }
    }

    /// Regions sampled each pass, in palette order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The change detector, if enabled.
    pub fn detector(&self) -> Option<&ChangeDetector> {
        self.detector.as_ref()
    }

    /// The controller link.
    pub fn link(&self) -> &ControllerLink {
        &self.link
    }

    /// Whether the pipeline gave up on the controller and only samples.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Run one pass.
    pub fn run_pass(&mut self) -> PassOutcome {
        if !self.degraded {
            if let Err(e) = self.link.health_check() {
                return self.on_session_error(e);
            }
        }

        if let Some(detector) = self.detector.as_mut() {
            match detector.should_update(&self.sampler) {
                Ok(decision) if !decision.update => {
                    debug!("Probe unchanged, skipping tick");
                    return PassOutcome::Continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Probe failed, skipping tick: {}", e);
                    return PassOutcome::Continue;
                }
            }
        }

        let palette = match self.sampler.sample(&self.regions) {
            Ok(palette) => palette,
            Err(e) => {
                if e.is_transient() {
                    warn!("Sampling failed, skipping tick: {}", e);
                } else {
                    error!("Sampling error, skipping tick: {}", e);
                }
                // Forget the probe sample so the next tick samples again.
                if let Some(detector) = self.detector.as_mut() {
                    detector.reset();
                }
                return PassOutcome::Continue;
            }
        };

        if self.verbose {
            info!("Palette: {}", palette);
        }

        self.deliver(&palette)
    }

    fn deliver(&mut self, palette: &Palette) -> PassOutcome {
        if self.degraded {
            debug!("No controller attached, palette dropped");
            return PassOutcome::Continue;
        }

        if !self.link.has_session() {
            match self.link.start(Some(palette)) {
                Ok(id) => {
                    info!("Controller session {} started", id);
                    // The palette already went out as launch arguments.
                    if self.link.config().launch == LaunchMode::FirstPalette {
                        return PassOutcome::Continue;
                    }
                }
                Err(e) => {
                    error!("Controller launch failed: {}", e);
                    return PassOutcome::Halt(ExitReason::Fatal(e.to_string()));
                }
            }
        }

        match self.link.push(palette) {
            Ok(outcome) => {
                debug!("Push outcome: {:?}", outcome);
                PassOutcome::Continue
            }
            Err(e) => self.on_session_error(e),
        }
    }

    fn on_session_error(&mut self, e: Error) -> PassOutcome {
        if !matches!(e, Error::SessionLost(_) | Error::SessionTerminated) {
            warn!("Controller check failed, skipping tick: {}", e);
            return PassOutcome::Continue;
        }

        match self.policy {
            SessionLostPolicy::Exit => {
                warn!("{}; exiting", e);
                PassOutcome::Halt(ExitReason::SessionLost)
            }
            SessionLostPolicy::Relaunch => {
                warn!("{}; relaunching on the next tick", e);
                if let Some(detector) = self.detector.as_mut() {
                    detector.reset();
                }
                PassOutcome::Continue
            }
            SessionLostPolicy::Continue => {
                warn!("{}; continuing without a controller", e);
                self.degraded = true;
                PassOutcome::Continue
            }
        }
    }
}

impl Pass for PalettePipeline {
    fn run(&mut self) -> PassOutcome {
        self.run_pass()
    }

    fn shutdown(&mut self) {
        if self.link.has_session() {
            self.link.stop();
        } else {
            debug!("No controller session to tear down");
        }
    }
}
