//! Rasterization of sparse depth samples into a dense quantized depth image.

use arfusion_image::Image;
use arfusion_imgproc::draw::draw_point_splat;

use crate::camera::PinholeCameraIntrinsic;

/// The defined max distance for a depth value, in millimeters.
pub const MAX_DEPTH_DISTANCE_MM: f32 = 4000.0;

/// The meter to millimeter conversion.
pub const METER_TO_MILLIMETER: f32 = 1000.0;

/// Sentinel value marking a depth cell with no data.
pub const DEPTH_NO_DATA: u8 = 255;

/// Splat side length used to fill gaps from the sparse sample density.
pub const SPLAT_THICKNESS: usize = 7;

/// Quantize a metric depth value into 8 bits over the 4 meter range.
///
/// Returns `None` for non-positive depths and for values that would reach
/// the reserved no-data sentinel.
#[inline]
pub fn quantize_depth(z_meters: f32) -> Option<u8> {
    if z_meters <= 0.0 {
        return None;
    }
    let value =
        (z_meters * METER_TO_MILLIMETER * u8::MAX as f32 / MAX_DEPTH_DISTANCE_MM).round();
    if value >= DEPTH_NO_DATA as f32 {
        return None;
    }
    Some(value as u8)
}

/// Invert the 8-bit depth quantization back to meters.
#[inline]
pub fn dequantize_depth(value: u8) -> f32 {
    value as f32 * MAX_DEPTH_DISTANCE_MM / (u8::MAX as f32 * METER_TO_MILLIMETER)
}

/// Rasterize an unordered batch of 3D samples into a quantized depth image.
///
/// The destination is reset to the no-data sentinel each call. Every sample
/// is projected through the pinhole model, discarded when `Z <= 0`, when the
/// projected pixel falls outside the camera's *native* dimensions, or when
/// the quantized depth would alias the sentinel, and otherwise splatted with
/// a small square footprint at the projected pixel. Splat writes are
/// additionally clamped to the destination buffer, so native-resolution and
/// buffer dimensions may differ safely.
///
/// Overlapping splats resolve last-write-wins; no averaging. This is an
/// explicit policy choice traded against per-cell depth tests.
///
/// # Arguments
///
/// * `points` - The batch of (X, Y, Z) samples in meters, camera frame.
/// * `intrinsics` - The depth camera intrinsics.
/// * `dst` - The destination depth image.
///
/// # Returns
///
/// The number of samples actually splatted.
pub fn rasterize_depth(
    points: &[[f32; 3]],
    intrinsics: &PinholeCameraIntrinsic,
    dst: &mut Image<u8, 1>,
) -> usize {
    dst.fill(DEPTH_NO_DATA);

    let mut written = 0;
    for point in points {
        let Some((px, py)) = intrinsics.project(point) else {
            continue;
        };
        let (x, y) = (px as i64, py as i64);
        if !intrinsics.contains(x, y) {
            continue;
        }
        let Some(value) = quantize_depth(point[2]) else {
            continue;
        };
        draw_point_splat(dst, (x, y), [value], SPLAT_THICKNESS);
        written += 1;
    }
    written
}
