// SPDX-License-Identifier: GPL-3.0-only

//! Region of interest handed to the capture source

use super::types::FrameRegion;
use crate::constants::REGION_OF_INTEREST_FRACTION;
use serde::{Deserialize, Serialize};

/// Normalized sub-rectangle of the frame in which symbols are detected
///
/// Origin and size are fractions of the frame (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self::centered(REGION_OF_INTEREST_FRACTION)
    }
}

impl RegionOfInterest {
    /// Centered square covering `fraction` of the frame width and height
    ///
    /// The fraction is clamped to `0.0..=1.0`.
    pub fn centered(fraction: f64) -> Self {
        let size = if fraction.is_nan() {
            REGION_OF_INTEREST_FRACTION
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let origin = (1.0 - size) / 2.0;
        Self {
            x: origin,
            y: origin,
            width: size,
            height: size,
        }
    }

    /// The whole frame
    pub fn full_frame() -> Self {
        Self::centered(1.0)
    }

    /// Whether a normalized point lies inside the region (edges included)
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Whether the center of a detected symbol lies inside the region
    pub fn contains(&self, region: &FrameRegion) -> bool {
        let (cx, cy) = region.center();
        self.contains_point(cx, cy)
    }
}

impl std::fmt::Display for RegionOfInterest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "origin=({}, {}) size=({}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}
