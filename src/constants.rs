// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long an accepted scan stays displayed before scanning resumes
pub const COOL_DOWN: Duration = Duration::from_secs(5);

/// Fraction of frame width and height covered by the region of interest
pub const REGION_OF_INTEREST_FRACTION: f64 = 0.3;

/// Post-start delay used when the region of interest is applied blindly
pub const REGION_OF_INTEREST_DELAY: Duration = Duration::from_secs(1);

/// Bounded capacity of the detection frame channel between source and gate
pub const FRAME_CHANNEL_CAPACITY: usize = 32;

/// Machine-readable code families the capture source is asked to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// EAN-8 linear barcode
    Ean8,
    /// EAN-13 linear barcode
    Ean13,
    /// PDF417 stacked barcode
    Pdf417,
    /// QR matrix code
    Qr,
}

impl Symbology {
    /// Every supported symbology, in the order they are requested
    pub const ALL: [Symbology; 4] = [
        Symbology::Ean8,
        Symbology::Ean13,
        Symbology::Pdf417,
        Symbology::Qr,
    ];

    /// Get display name for the symbology
    pub fn display_name(&self) -> &'static str {
        match self {
            Symbology::Ean8 => "EAN-8",
            Symbology::Ean13 => "EAN-13",
            Symbology::Pdf417 => "PDF417",
            Symbology::Qr => "QR",
        }
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Supported file formats for the still-image source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Timing constants for capture sources
pub mod timing {
    use super::Duration;

    /// Granularity at which a sleeping capture loop checks for a stop request
    pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Still-image QR detection limits
pub mod detection {
    /// Images are downscaled so neither side exceeds this before detection
    pub const MAX_DIMENSION: u32 = 640;
}

/// User-facing messages printed by the terminal presenter
pub mod messages {
    /// Shown when camera authorization has been denied
    pub const CAMERA_ACCESS_DENIED: &str =
        "Camera access is denied. Please enable access in your settings.";
}
