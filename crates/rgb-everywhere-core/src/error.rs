//! Error types for rgb-everywhere.

use thiserror::Error;

use crate::{DisplayBounds, Region, SessionId};

/// Main error type for rgb-everywhere operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Region with a zero-sized side
    #[error("Invalid region: {width}x{height} at ({x}, {y})")]
    InvalidRegion {
        /// Left edge
        x: u32,
        /// Top edge
        y: u32,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// Region does not fit on the display
    #[error("Region {region} exceeds display bounds {display}")]
    RegionOutOfBounds {
        /// Offending region
        region: Region,
        /// Bounds of the display it was checked against
        display: DisplayBounds,
    },

    /// No display at the configured index
    #[error("Display not found: index {0}")]
    DisplayNotFound(usize),

    /// Screen capture failed for a region
    #[error("Capture of {region} failed: {reason}")]
    Capture {
        /// Region that was being captured
        region: Region,
        /// Backend error message
        reason: String,
    },

    /// Dominant color extraction failed
    #[error("Color extraction failed: {0}")]
    Extraction(String),

    /// Palette does not have the expected number of colors
    #[error("Palette shape mismatch: expected {expected} colors, got {actual}")]
    ShapeMismatch {
        /// Expected color count
        expected: usize,
        /// Actual color count
        actual: usize,
    },

    /// Controller process could not be launched
    #[error("Failed to launch controller '{path}': {reason}")]
    Launch {
        /// Executable path
        path: String,
        /// OS error message
        reason: String,
    },

    /// Controller session was lost (write failure or process exit)
    #[error("Controller session lost: {0}")]
    SessionLost(SessionId),

    /// Session already terminated
    #[error("Controller session already terminated")]
    SessionTerminated,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error only affects the current sampling pass.
    ///
    /// Transient errors are logged and the tick is skipped; everything else
    /// either tears down the controller session or stops the process.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Capture { .. } | Error::Extraction(_) | Error::ShapeMismatch { .. }
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
