//! Plane conversion operations between quantized and normalized images.

use crate::{Image, ImageError};

/// Convert a u8 plane into a f32 plane normalized to `[0, 1]`.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn convert_norm_u8_f32(src: &Image<u8, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }
    for (d, s) in dst.as_slice_mut().iter_mut().zip(src.as_slice().iter()) {
        *d = *s as f32 / 255.0;
    }
    Ok(())
}

/// Convert a normalized f32 plane back into a u8 plane.
///
/// Values are scaled by 255 and saturated to `[0, 255]`.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn convert_norm_f32_u8(src: &Image<f32, 1>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }
    for (d, s) in dst.as_slice_mut().iter_mut().zip(src.as_slice().iter()) {
        *d = (s * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    Ok(())
}
