//! Display-ready encoding of captured frames.
//!
//! The webview renders previews from data URLs, so each frame is encoded
//! in memory and base64'd. Nothing is written to disk.

use crate::capture::RawFrame;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Encoding used for preview images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    #[default]
    Png,
    /// Faster to encode for large regions, lossy.
    Jpeg,
}

impl PreviewFormat {
    fn image_format(self) -> ImageFormat {
        match self {
            PreviewFormat::Png => ImageFormat::Png,
            PreviewFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    fn mime(self) -> &'static str {
        match self {
            PreviewFormat::Png => "image/png",
            PreviewFormat::Jpeg => "image/jpeg",
        }
    }
}

/// An encoded preview ready to drop into an `<img src>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Encodes a frame as a data URL. Alpha and row padding are dropped.
pub fn encode_preview(frame: &RawFrame, format: PreviewFormat) -> Result<PreviewImage, PreviewError> {
    if frame.is_empty() {
        return Err(PreviewError::Empty);
    }

    let rgb = DynamicImage::ImageRgb8(frame.to_rgb_image());

    let mut bytes: Vec<u8> = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), format.image_format())
        .map_err(|e| PreviewError::Encoding(e.to_string()))?;

    Ok(PreviewImage {
        data_url: format!("data:{};base64,{}", format.mime(), STANDARD.encode(&bytes)),
        width: frame.width(),
        height: frame.height(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Cannot encode an empty frame")]
    Empty,

    #[error("Preview encoding failed: {0}")]
    Encoding(String),
}
