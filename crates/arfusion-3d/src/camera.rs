/// A struct representing the intrinsic parameters of a pinhole camera.
///
/// Immutable for the lifetime of a sensor session; refreshed once per
/// camera connect and freely shared across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCameraIntrinsic {
    /// The focal length in pixels (fx, fy)
    pub focal_length: (f32, f32),
    /// The principal point in pixels (cx, cy)
    pub principal_point: (f32, f32),
    /// The image dimensions (width, height)
    pub image_size: (u32, u32),
}

impl PinholeCameraIntrinsic {
    /// Creates a new PinholeCameraIntrinsic with the given parameters.
    pub fn new(
        focal_length: (f32, f32),
        principal_point: (f32, f32),
        image_size: (u32, u32),
    ) -> Self {
        Self {
            focal_length,
            principal_point,
            image_size,
        }
    }

    /// Project a camera-space point onto the image plane.
    ///
    /// Returns the continuous pixel coordinate `x = fx * X / Z + cx`,
    /// `y = fy * Y / Z + cy`, or `None` when `Z <= 0` (behind or on the
    /// optical center, where the projection is undefined).
    pub fn project(&self, point: &[f32; 3]) -> Option<(f32, f32)> {
        let [x, y, z] = *point;
        if z <= 0.0 {
            return None;
        }
        let (fx, fy) = self.focal_length;
        let (cx, cy) = self.principal_point;
        Some((fx * (x / z) + cx, fy * (y / z) + cy))
    }

    /// Back-project a pixel coordinate with a depth value to camera space.
    ///
    /// Inverse pinhole relations `X = (x - cx) / fx * Z`,
    /// `Y = (y - cy) / fy * Z`.
    pub fn unproject(&self, x: f32, y: f32, z: f32) -> [f32; 3] {
        let (fx, fy) = self.focal_length;
        let (cx, cy) = self.principal_point;
        [(x - cx) / fx * z, (y - cy) / fy * z, z]
    }

    /// Whether a pixel coordinate lies inside the camera's native image.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.image_size.0 as i64 && y >= 0 && y < self.image_size.1 as i64
    }

    /// Return the intrinsics scaled by a uniform factor.
    ///
    /// Focal lengths, principal point and dimensions all scale linearly with
    /// the image resolution.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            focal_length: (self.focal_length.0 * factor, self.focal_length.1 * factor),
            principal_point: (
                self.principal_point.0 * factor,
                self.principal_point.1 * factor,
            ),
            image_size: (
                (self.image_size.0 as f32 * factor) as u32,
                (self.image_size.1 as f32 * factor) as u32,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn intrinsics() -> PinholeCameraIntrinsic {
        PinholeCameraIntrinsic::new((240.0, 240.0), (160.0, 90.0), (320, 180))
    }

    #[test]
    fn test_project() {
        let cam = intrinsics();
        let (x, y) = cam.project(&[0.5, 0.25, 1.0]).unwrap();
        assert_relative_eq!(x, 280.0);
        assert_relative_eq!(y, 150.0);
    }

    #[test]
    fn test_project_non_positive_z() {
        let cam = intrinsics();
        assert!(cam.project(&[0.1, 0.1, 0.0]).is_none());
        assert!(cam.project(&[0.1, 0.1, -1.0]).is_none());
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let cam = intrinsics();
        let point = [0.3, -0.2, 2.5];
        let (x, y) = cam.project(&point).unwrap();
        let back = cam.unproject(x, y, point[2]);
        for k in 0..3 {
            assert_relative_eq!(back[k], point[k], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_contains() {
        let cam = intrinsics();
        assert!(cam.contains(0, 0));
        assert!(cam.contains(319, 179));
        assert!(!cam.contains(320, 0));
        assert!(!cam.contains(0, 180));
        assert!(!cam.contains(-1, 0));
    }

    #[test]
    fn test_scaled() {
        let cam = intrinsics().scaled(2.0);
        assert_relative_eq!(cam.focal_length.0, 480.0);
        assert_relative_eq!(cam.principal_point.1, 180.0);
        assert_eq!(cam.image_size, (640, 360));
    }
}
