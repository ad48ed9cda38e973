//! Still-image import — the drag-and-drop path.
//!
//! Bypasses the capture loop entirely: decode once, reduce once, publish.

use crate::capture::RawFrame;
use crate::histogram::{self, Histogram};
use std::path::Path;

/// Decodes an image file into a frame and its histogram.
///
/// Blocking: call from a worker, never from the presentation context.
pub fn histogram_from_file(path: &Path) -> Result<(Histogram, RawFrame), ImportError> {
    let start = std::time::Instant::now();

    let image = image::open(path).map_err(|e| ImportError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let frame = RawFrame::from_rgba_image(image.to_rgba8());
    let histogram = histogram::reduce(&frame);

    log::info!(
        "[IMPORT] {} ({}x{}) reduced in {}ms",
        path.display(),
        frame.width(),
        frame.height(),
        start.elapsed().as_millis()
    );

    Ok((histogram, frame))
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Nothing to import")]
    NoFile,

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Import task failed: {0}")]
    Task(String),
}
