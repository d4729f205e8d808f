//! # rgb-everywhere-capture
//!
//! Screen capture and color extraction for rgb-everywhere.
//!
//! This crate provides:
//! - Pixel buffers for captured regions
//! - The screen capture seam and its `xcap` backend
//! - The dominant color extraction seam and a k-means implementation
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on rgb-everywhere-core
//! and talks to the OS. Everything above it only sees the traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod extractor;
pub mod screen;

// Re-export commonly used types
pub use buffer::PixelBuffer;
pub use extractor::{ColorExtractor, KMeansExtractor};
pub use screen::ScreenCapture;
#[cfg(feature = "xcap")]
pub use screen::XcapScreen;
