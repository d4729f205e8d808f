//! rgb-everywhere application library
//!
//! Wiring between the sampling pipeline, the controller link and the
//! process lifecycle. The binary entry point is in main.rs.

pub mod app;
pub mod cli;
pub mod operator;
pub mod pipeline;
pub mod scheduler;

// Re-export commonly used types
pub use app::build_pipeline;
pub use cli::CliArgs;
pub use pipeline::PalettePipeline;
pub use scheduler::{
    ExitReason, Pass, PassOutcome, Scheduler, SchedulerHandle, SchedulerState, ShutdownSignal,
};
