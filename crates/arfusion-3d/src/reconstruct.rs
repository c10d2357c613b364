//! Back-projection of a filtered depth image into a 3D vertex buffer.

use arfusion_image::Image;

use crate::camera::PinholeCameraIntrinsic;
use crate::rasterize::dequantize_depth;

/// Anisotropic correction scale on X.
///
/// Calibration fudge factor compensating residual misalignment between the
/// depth and color optical axes, found empirically; not a physical law.
pub const DEPTH_CORRECTION_X: f32 = 0.9;

/// Anisotropic correction scale on Y. See [`DEPTH_CORRECTION_X`].
pub const DEPTH_CORRECTION_Y: f32 = 1.2;

/// Back-project a quantized depth image into a flat vertex buffer.
///
/// Every pixel is dequantized and back-projected through the inverse pinhole
/// relations, the anisotropic correction applied, and the resulting (X, Y, Z)
/// appended as a flattened triple. The buffer is fully replaced; its final
/// length is exactly `width * height * 3`. Pixels with zero depth are emitted
/// as degenerate points at the origin ray, matching the renderer's
/// expectation of a full grid.
///
/// # Arguments
///
/// * `depth` - The depth image at the output resolution.
/// * `intrinsics` - Depth camera intrinsics already scaled by the ratio of
///   output to native resolution.
/// * `out` - The vertex buffer to replace.
pub fn reconstruct_pointcloud(
    depth: &Image<u8, 1>,
    intrinsics: &PinholeCameraIntrinsic,
    out: &mut Vec<f32>,
) {
    out.clear();
    out.reserve(depth.cols() * depth.rows() * 3);

    let data = depth.as_slice();
    for y in 0..depth.rows() {
        for x in 0..depth.cols() {
            let z = dequantize_depth(data[y * depth.cols() + x]);
            let [px, py, pz] = intrinsics.unproject(x as f32, y as f32, z);
            out.push(px * DEPTH_CORRECTION_X);
            out.push(py * DEPTH_CORRECTION_Y);
            out.push(pz);
        }
    }
}
