//! # rgb-everywhere
//!
//! Samples the dominant colors of the screen at a fixed interval and streams
//! them to an RGB lighting controller process.
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - rgb-everywhere-core: Core types and configuration
//! - rgb-everywhere-capture: Screen capture and color extraction
//! - rgb-everywhere-sampler: Region sampling and change detection
//! - rgb-everywhere-controller: Controller process management

use std::sync::Arc;

use anyhow::Context;
use rgb_everywhere::cli::{CliArgs, USAGE};
use rgb_everywhere::{build_pipeline, operator, Scheduler, ShutdownSignal};
use rgb_everywhere_capture::{KMeansExtractor, XcapScreen};
use rgb_everywhere_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::from_env()?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = AppConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if args.verbose {
        config.verbose = true;
    }

    // Initialize logging; stdout is reserved for the operator prompt
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "rgb-everywhere v{} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    let screen = Arc::new(XcapScreen::new(config.display_index));
    let extractor = Arc::new(KMeansExtractor::new());
    let pipeline =
        build_pipeline(&config, screen, extractor).context("Failed to start the pipeline")?;

    let shutdown = ShutdownSignal::new();

    operator::spawn(shutdown.clone()).context("Failed to start the operator reader")?;

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received");
                ctrl_c.trigger();
            }
            Err(e) => tracing::warn!("Ctrl-C handler unavailable: {}", e),
        }
    });

    let reason = Scheduler::new(config.refresh_interval(), pipeline, shutdown)
        .run()
        .await;

    let code = reason.exit_code();
    tracing::info!("rgb-everywhere exiting: {:?} (code {})", reason, code);
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
