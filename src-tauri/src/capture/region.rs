//! Pure region cropping logic — functional core.
//!
//! Takes a captured monitor image and the capture rectangle expressed in
//! that image's coordinates, returns the owned sub-image.

use image::RgbaImage;

/// Crops `image` to the given rectangle.
///
/// Fails instead of silently shrinking: the caller decides what a
/// rectangle that leaves the image means.
pub fn crop_region(
    image: &RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<RgbaImage, CropError> {
    if width == 0 || height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = image.dimensions();

    let fits_x = x.checked_add(width).is_some_and(|right| right <= img_width);
    let fits_y = y.checked_add(height).is_some_and(|bottom| bottom <= img_height);
    if !fits_x || !fits_y {
        return Err(CropError::OutOfBounds {
            requested: (x, y, width, height),
            image_size: (img_width, img_height),
        });
    }

    Ok(image::imageops::crop_imm(image, x, y, width, height).to_image())
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: (u32, u32, u32, u32),
        image_size: (u32, u32),
    },
}
