// SPDX-License-Identifier: GPL-3.0-only

//! Core types flowing through the scan gate
//!
//! Capture sources emit [`Detection`]s grouped into frames. The gate stamps
//! each one with its own clock, turning it into a [`DetectionEvent`], and
//! publishes the result as a [`ScanState`] snapshot.

use crate::constants::Symbology;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f64,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f64,
    /// Width as fraction of frame width
    pub width: f64,
    /// Height as fraction of frame height
    pub height: f64,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f64 / frame_width as f64,
            y: y as f64 / frame_height as f64,
            width: width as f64 / frame_width as f64,
            height: height as f64 / frame_height as f64,
        }
    }

    /// Center point of the region
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One decoded symbol as reported by a capture source
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Decoded payload, opaque to the gate
    pub payload: String,
    /// Code family, when the source knows it
    pub symbology: Option<Symbology>,
    /// Where in the frame the symbol was found, when the source knows it
    pub location: Option<FrameRegion>,
}

impl Detection {
    /// Detection carrying only a payload
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            symbology: None,
            location: None,
        }
    }

    pub fn with_symbology(mut self, symbology: Symbology) -> Self {
        self.symbology = Some(symbology);
        self
    }

    pub fn with_location(mut self, location: FrameRegion) -> Self {
        self.location = Some(location);
        self
    }
}

/// All detections produced from one processed frame, in source order
pub type DetectionFrame = Vec<Detection>;

/// A detection stamped with its arrival time on the gate's clock
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    pub payload: String,
    pub symbology: Option<Symbology>,
    pub received_at: Instant,
}

impl DetectionEvent {
    pub fn new(payload: impl Into<String>, received_at: Instant) -> Self {
        Self {
            payload: payload.into(),
            symbology: None,
            received_at,
        }
    }

    /// Stamp a source detection with an arrival instant
    pub fn from_detection(detection: Detection, received_at: Instant) -> Self {
        Self {
            payload: detection.payload,
            symbology: detection.symbology,
            received_at,
        }
    }
}

/// Result of offering one event to the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The event became the current scan
    Accepted(String),
    /// A cool-down was active; nothing changed
    Ignored,
}

impl AcceptOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptOutcome::Accepted(_))
    }
}

/// Observable snapshot of the gate, as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanState {
    pub is_scanning: bool,
    pub current_result: Option<String>,
    /// Number of scans accepted so far; identifies the displayed result even
    /// when the same payload is scanned twice in a row
    pub scan_count: u64,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            is_scanning: true,
            current_result: None,
            scan_count: 0,
        }
    }
}
