//! # rgb-everywhere-core
//!
//! Core types for rgb-everywhere.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other rgb-everywhere crates. It provides:
//!
//! - Geometry types (Region, DisplayBounds)
//! - Color types (ColorSample, Palette)
//! - Controller session types (SessionId, SessionStatus)
//! - Application configuration
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other rgb-everywhere crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod session;

// Re-export commonly used types
pub use color::{ColorSample, Palette};
pub use config::{
    AppConfig, ChangeDetectionSettings, ControllerSettings, LaunchMode, SamplingSettings,
    SessionLostPolicy,
};
pub use error::{Error, Result};
pub use geometry::{DisplayBounds, Region};
pub use session::{SessionId, SessionStatus};
