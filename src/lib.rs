// SPDX-License-Identifier: GPL-3.0-only

//! Barcode Scanner - debounced scanning sessions over a live detection feed
//!
//! A capture source (camera pipeline, text replay, image files) reports
//! decoded codes frame by frame. The scan gate accepts the first one, holds
//! it as the current result for a cool-down, ignores everything else in the
//! meantime, and then resumes scanning.
//!
//! # Architecture
//!
//! - [`scanner`]: the debounce state machine, its shared handle, the region
//!   of interest, and still-image QR detection
//! - [`session`]: the capture source trait, concrete sources, and the session
//!   controller
//! - [`presenter`]: rendering of published state for the terminal
//! - [`config`]: user configuration
//!
//! # Example
//!
//! ```ignore
//! let (source, feed) = CallbackSource::new("camera");
//! let mut session = SessionController::new(source, Config::default());
//! session.start().await?;
//! feed.signal_ready();
//! feed.deliver_payloads(["4006381333931"]);
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod presenter;
pub mod scanner;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use constants::Symbology;
pub use errors::{AppError, AppResult, SessionError, SessionResult};
pub use scanner::{AcceptOutcome, RegionOfInterest, ScanGate, ScanGateHandle, ScanState};
pub use session::{CaptureSource, SessionController, SessionStatus};
