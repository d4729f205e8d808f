//! # rgb-everywhere-sampler
//!
//! Sampling pipeline for rgb-everywhere.
//!
//! This crate provides:
//! - The sampler that turns configured regions into a fixed-size palette
//! - The probe-based change detector that gates full sampling
//! - Scripted screen and extractor doubles for tests and benchmarks
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on rgb-everywhere-core
//! and on the capture traits from rgb-everywhere-capture, never on a
//! concrete capture backend.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod sampler;
pub mod testing;

// Re-export commonly used types
pub use change::{ChangeDecision, ChangeDetector};
pub use sampler::Sampler;
