//! # rgb-everywhere-controller
//!
//! Controller process management for rgb-everywhere.
//!
//! This crate provides:
//! - The palette wire format (one delimited line of channel values per update)
//! - `ControllerSession`, the owned handle to one running controller process
//! - `ControllerLink`, which launches, feeds, health-checks and stops sessions
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on
//! rgb-everywhere-core and knows nothing about screen capture.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod link;
pub mod session;
pub mod wire;

// Re-export commonly used types
pub use link::{ControllerLink, LinkConfig, PushOutcome};
pub use session::ControllerSession;
pub use wire::{format_line, launch_args, DEFAULT_SEPARATOR};
