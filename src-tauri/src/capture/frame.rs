//! Raw pixel buffers produced by a capture or an import.
//!
//! A `RawFrame` owns its bytes. It is created once per loop iteration,
//! moved into the reducer by reference and then into the publisher by
//! value, and dropped at the end of `publish`.

use image::{RgbImage, RgbaImage};

/// Byte layout of a single pixel.
///
/// Alpha bytes, when present, are skipped by every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 4 bytes per pixel: R, G, B, A (xcap and `image` output)
    Rgba8,
    /// 4 bytes per pixel: B, G, R, A (GDI / DXGI layout)
    Bgra8,
    /// 3 bytes per pixel: R, G, B
    Rgb8,
    /// 3 bytes per pixel: B, G, R
    Bgr8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
        }
    }

    /// Byte offsets of the red, green and blue channels inside one pixel.
    pub fn channel_offsets(self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Rgb8 => (0, 1, 2),
            PixelFormat::Bgra8 | PixelFormat::Bgr8 => (2, 1, 0),
        }
    }
}

/// Owned, row-major pixel buffer.
///
/// `stride` is the byte distance between the starts of two rows and may be
/// larger than `width * bytes_per_pixel` when rows are padded.
#[derive(Debug, Clone)]
pub struct RawFrame {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Row stride {stride} is smaller than {row_bytes} bytes of pixel data")]
    StrideTooSmall { stride: usize, row_bytes: usize },

    #[error("Buffer holds {actual} bytes, {needed} needed for {width}x{height}")]
    BufferTooShort {
        width: u32,
        height: u32,
        needed: usize,
        actual: usize,
    },
}

impl RawFrame {
    /// Wraps an existing buffer, validating that it covers every row.
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        if stride < row_bytes {
            return Err(FrameError::StrideTooSmall { stride, row_bytes });
        }

        // The last row does not need trailing padding.
        let needed = match height as usize {
            0 => 0,
            rows => stride * (rows - 1) + row_bytes,
        };
        if data.len() < needed {
            return Err(FrameError::BufferTooShort {
                width,
                height,
                needed,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Takes ownership of an RGBA image without copying its pixels.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            stride: width as usize * 4,
            format: PixelFormat::Rgba8,
            data: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Iterates rows, each trimmed to its pixel bytes (padding excluded).
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        let rows = if row_bytes == 0 { 0 } else { self.height as usize };
        (0..rows).map(move |row| {
            let start = row * self.stride;
            &self.data[start..start + row_bytes]
        })
    }

    /// Iterates every pixel as `[r, g, b]`, in row-major order.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        let bpp = self.format.bytes_per_pixel();
        let (r, g, b) = self.format.channel_offsets();
        self.rows()
            .flat_map(move |row| row.chunks_exact(bpp))
            .map(move |px| [px[r], px[g], px[b]])
    }

    /// Copies the frame into a packed RGB image, dropping alpha and padding.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut packed = Vec::with_capacity(self.pixel_count() as usize * 3);
        for px in self.rgb_pixels() {
            packed.extend_from_slice(&px);
        }
        // Length is exactly width * height * 3 by construction.
        RgbImage::from_raw(self.width, self.height, packed)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}
