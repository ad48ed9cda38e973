//! Region capture using the `xcap` crate.
//!
//! Infrastructure layer: the only capture code that talks to the OS.
//! Everything above it only sees the `FrameSource` trait.

use super::frame::RawFrame;
use super::geometry::CaptureRect;
use super::region::crop_region;
use xcap::Monitor;

/// Produces one raw frame per call for a desktop rectangle.
///
/// Blocking: the platform screen copy dominates each loop iteration.
pub trait FrameSource: Send + Sync {
    fn capture(&self, rect: &CaptureRect) -> Result<RawFrame, CaptureError>;
}

/// Captures the monitor under the rectangle and crops to it.
pub struct ScreenFrameSource;

impl FrameSource for ScreenFrameSource {
    fn capture(&self, rect: &CaptureRect) -> Result<RawFrame, CaptureError> {
        if rect.is_empty() {
            return Err(CaptureError::CaptureUnavailable(format!(
                "degenerate rectangle {}x{}",
                rect.width, rect.height
            )));
        }

        let monitor = Monitor::from_point(rect.x, rect.y).map_err(|e| {
            CaptureError::CaptureUnavailable(format!(
                "no monitor at ({},{}): {}",
                rect.x, rect.y, e
            ))
        })?;

        let origin_x = monitor
            .x()
            .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;
        let origin_y = monitor
            .y()
            .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;

        // from_point guarantees the corner lies on this monitor.
        let local_x = rect.x.saturating_sub(origin_x).max(0) as u32;
        let local_y = rect.y.saturating_sub(origin_y).max(0) as u32;

        let cropped = crop_region(&image, local_x, local_y, rect.width, rect.height)
            .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;

        Ok(RawFrame::from_rgba_image(cropped))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture target is no longer available: {0}")]
    TargetUnavailable(String),

    #[error("Screen capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_rect_is_rejected_before_touching_the_screen() {
        let rect = CaptureRect {
            x: 0,
            y: 0,
            width: 0,
            height: 10,
        };
        let result = ScreenFrameSource.capture(&rect);
        assert!(matches!(result, Err(CaptureError::CaptureUnavailable(_))));
    }

    #[test]
    #[ignore = "requires a graphical display and screen recording permission"]
    fn captures_top_left_corner() {
        let rect = CaptureRect {
            x: 0,
            y: 0,
            width: 64,
            height: 32,
        };
        let frame = ScreenFrameSource.capture(&rect).expect("capture failed");
        assert_eq!((frame.width(), frame.height()), (64, 32));
    }
}
