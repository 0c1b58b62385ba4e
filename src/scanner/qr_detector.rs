// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection for still images
//!
//! Used by the image capture source. Images are converted to grayscale and
//! downscaled before being handed to `rqrr`; the decoded payloads come back
//! with their bounding boxes normalized to the original frame.

use super::types::{Detection, FrameRegion};
use crate::constants::{Symbology, detection::MAX_DIMENSION};
use image::{DynamicImage, GrayImage, imageops::FilterType};
use std::path::Path;
use tracing::{debug, trace};

/// QR code detector
pub struct QrDetector {
    /// Maximum dimension for processing (images are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    pub fn new() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Load an image file and detect QR codes in it
    pub fn detect_file(&self, path: &Path) -> Result<Vec<Detection>, image::ImageError> {
        let image = image::open(path)?;
        Ok(self.detect(&image))
    }

    /// Detect QR codes in a decoded image
    pub fn detect(&self, image: &DynamicImage) -> Vec<Detection> {
        let start = std::time::Instant::now();
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let (gray, scale) = self.prepare(image);
        trace!(
            proc_width = gray.width(),
            proc_height = gray.height(),
            scale,
            "Prepared grayscale image"
        );

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            let content = match grid.decode() {
                Ok((_meta, content)) => content,
                Err(e) => {
                    debug!(error = ?e, "Failed to decode QR code");
                    continue;
                }
            };

            let corners = grid.bounds.map(|p| (p.x as f32, p.y as f32));
            let region = bounds_to_region(&corners, scale, width, height);
            debug!(
                content = %content,
                x = region.x,
                y = region.y,
                "Detected QR code"
            );
            detections.push(
                Detection::new(content)
                    .with_symbology(Symbology::Qr)
                    .with_location(region),
            );
        }

        if !detections.is_empty() {
            debug!(
                count = detections.len(),
                total_ms = start.elapsed().as_millis(),
                "QR detection found codes"
            );
        }
        detections
    }

    /// Grayscale conversion plus optional downscale; returns the scale factor
    fn prepare(&self, image: &DynamicImage) -> (GrayImage, f32) {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width <= self.max_dimension && height <= self.max_dimension {
            return (gray, 1.0);
        }

        let scale = (width as f32 / self.max_dimension as f32)
            .max(height as f32 / self.max_dimension as f32);
        let new_width = ((width as f32 / scale) as u32).max(1);
        let new_height = ((height as f32 / scale) as u32).max(1);
        (
            image::imageops::resize(&gray, new_width, new_height, FilterType::Triangle),
            scale,
        )
    }
}

/// Map corner points in processed-image pixels to a normalized frame region
fn bounds_to_region(
    corners: &[(f32, f32); 4],
    scale: f32,
    frame_width: u32,
    frame_height: u32,
) -> FrameRegion {
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).max(0.0);
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).max(0.0);
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

    let x = ((min_x * scale) as u32).min(frame_width);
    let y = ((min_y * scale) as u32).min(frame_height);
    let right = ((max_x * scale).max(0.0) as u32).min(frame_width);
    let bottom = ((max_y * scale).max(0.0) as u32).min(frame_height);

    FrameRegion::from_pixels(
        x,
        y,
        right.saturating_sub(x),
        bottom.saturating_sub(y),
        frame_width,
        frame_height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_bounds_to_region_scales_back() {
        // Corners in a half-size processed image.
        let corners = [(40.0, 30.0), (80.0, 30.0), (80.0, 90.0), (40.0, 90.0)];
        let region = bounds_to_region(&corners, 2.0, 400, 300);
        assert_eq!(region, FrameRegion::from_pixels(80, 60, 80, 120, 400, 300));
    }

    #[test]
    fn test_bounds_are_clamped_to_frame() {
        let corners = [(-5.0, -5.0), (500.0, -5.0), (500.0, 500.0), (-5.0, 500.0)];
        let region = bounds_to_region(&corners, 1.0, 100, 100);
        assert_eq!(region, FrameRegion::from_pixels(0, 0, 100, 100, 100, 100));
    }

    #[test]
    fn test_blank_image_has_no_codes() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])));
        assert!(QrDetector::new().detect(&blank).is_empty());
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let detector = QrDetector::with_max_dimension(100);
        let big = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 200, Luma([0])));
        let (gray, scale) = detector.prepare(&big);
        assert_eq!(gray.dimensions(), (100, 50));
        assert_eq!(scale, 4.0);
    }
}
