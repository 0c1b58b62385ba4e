// SPDX-License-Identifier: GPL-3.0-only

//! Scan debouncing
//!
//! [`ScanGate`] is the pure state machine, [`ScanGateHandle`] the serialized
//! wrapper that owns the cool-down timers and publishes state to observers.

pub mod gate;
pub mod handle;
pub mod qr_detector;
pub mod region;
pub mod types;

pub use gate::{CoolDownTimer, ScanGate};
pub use handle::ScanGateHandle;
pub use qr_detector::QrDetector;
pub use region::RegionOfInterest;
pub use types::{AcceptOutcome, Detection, DetectionEvent, DetectionFrame, FrameRegion, ScanState};
