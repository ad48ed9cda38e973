//! Luminance histogram — functional core.
//!
//! Pure: a frame goes in, 256 counters come out.

use crate::capture::RawFrame;
use serde::ser::{Serialize, Serializer};

pub const BUCKETS: usize = 256;

/// Per-bucket pixel counts, index = luma 0..=255.
///
/// The counts always sum to the pixel count of the frame they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; BUCKETS],
}

impl Histogram {
    pub fn empty() -> Self {
        Self {
            counts: [0; BUCKETS],
        }
    }

    pub fn counts(&self) -> &[u32; BUCKETS] {
        &self.counts
    }

    pub fn bucket(&self, luma: u8) -> u32 {
        self.counts[luma as usize]
    }

    /// Sum of all buckets, i.e. the number of pixels reduced.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Largest single bucket, used by the chart for auto scaling.
    pub fn peak(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::empty()
    }
}

// serde derives stop at 32-element arrays.
impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.counts.iter())
    }
}

/// Rec. 601 luma, rounded half-up: `round(0.299 R + 0.587 G + 0.114 B)`.
///
/// Integer weights keep the result exact; the maximum is
/// `(255 * 1000 + 500) / 1000 == 255`, so it always fits a byte.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// Reduces a frame to its luminance histogram.
///
/// Channel order and stride come from the frame's pixel format, so the
/// same loop serves 3- and 4-byte layouts. An empty frame yields an
/// all-zero histogram.
pub fn reduce(frame: &RawFrame) -> Histogram {
    let mut histogram = Histogram::empty();
    for [r, g, b] in frame.rgb_pixels() {
        histogram.counts[luma(r, g, b) as usize] += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PixelFormat;
    use image::{Rgba, RgbaImage};

    fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> RawFrame {
        let img = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        RawFrame::from_rgba_image(img)
    }

    #[test]
    fn luma_extremes() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
    }

    #[test]
    fn luma_rounds_instead_of_truncating() {
        // 0.299 * 255 = 76.245 -> 76
        assert_eq!(luma(255, 0, 0), 76);
        // 0.587 * 255 = 149.685 -> 150
        assert_eq!(luma(0, 255, 0), 150);
        // 0.114 * 255 = 29.07 -> 29
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn uniform_frame_fills_one_bucket() {
        let frame = uniform(40, 20, [200, 100, 50]);
        let histogram = reduce(&frame);
        let expected = luma(200, 100, 50);
        assert_eq!(histogram.bucket(expected), 800);
        assert_eq!(
            histogram.counts().iter().filter(|&&c| c != 0).count(),
            1
        );
    }

    #[test]
    fn black_and_white_pair() {
        let data = vec![255, 255, 255, 0, 0, 0];
        let frame = RawFrame::new(2, 1, 6, PixelFormat::Rgb8, data).unwrap();
        let histogram = reduce(&frame);
        assert_eq!(histogram.bucket(255), 1);
        assert_eq!(histogram.bucket(0), 1);
        assert_eq!(histogram.total(), 2);
    }

    #[test]
    fn sum_matches_pixel_count() {
        let mut img = RgbaImage::new(17, 9);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x * 15) as u8, (y * 28) as u8, (x * y) as u8, 0]);
        }
        let frame = RawFrame::from_rgba_image(img);
        assert_eq!(reduce(&frame).total(), frame.pixel_count());
    }

    #[test]
    fn bgra_channels_are_swapped() {
        // Pure red in BGRA byte order
        let frame = RawFrame::new(1, 1, 4, PixelFormat::Bgra8, vec![0, 0, 255, 255]).unwrap();
        assert_eq!(reduce(&frame).bucket(76), 1);
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = reduce(&uniform(4, 4, [10, 20, 30]));
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0]));
        let transparent = reduce(&RawFrame::from_rgba_image(img));
        assert_eq!(opaque, transparent);
    }

    #[test]
    fn row_padding_is_skipped() {
        // 1x2 RGB, stride 4: the padding byte would be read as red if not skipped
        let data = vec![0, 0, 0, 0xFF, 0, 0, 0];
        let frame = RawFrame::new(1, 2, 4, PixelFormat::Rgb8, data).unwrap();
        let histogram = reduce(&frame);
        assert_eq!(histogram.bucket(0), 2);
    }

    #[test]
    fn empty_frame_gives_zero_histogram() {
        let frame = RawFrame::new(0, 0, 0, PixelFormat::Rgba8, Vec::new()).unwrap();
        let histogram = reduce(&frame);
        assert_eq!(histogram, Histogram::empty());
        assert_eq!(histogram.peak(), 0);
    }

    #[test]
    fn serializes_as_flat_array() {
        let histogram = reduce(&uniform(1, 1, [0, 0, 0]));
        let json = serde_json::to_value(&histogram).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), BUCKETS);
        assert_eq!(arr[0], 1);
    }
}
