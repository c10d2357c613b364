//! Pose samples, sensor extrinsics and world frame composition.

use glam::{Mat4, Quat, Vec3};

/// The physical reference frames a pose can relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateFrame {
    /// The motion tracking origin, fixed when the service starts.
    StartOfService,
    /// The device body frame.
    Device,
    /// The inertial measurement unit frame.
    Imu,
    /// The color camera frame.
    CameraColor,
    /// The depth camera frame.
    CameraDepth,
}

/// A timestamped rigid transform between two coordinate frames.
///
/// Only trusted when `valid` is set; invalid samples convert to the identity
/// matrix so a stale or garbage transform can never leak downstream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseSample {
    /// Rotation component.
    pub rotation: Quat,
    /// Translation component, in meters.
    pub translation: Vec3,
    /// Whether the tracking subsystem reported this pose as valid.
    pub valid: bool,
    /// Acquisition timestamp, in seconds.
    pub timestamp: f64,
}

impl PoseSample {
    /// Create a valid pose sample.
    pub fn new(rotation: Quat, translation: Vec3, timestamp: f64) -> Self {
        Self {
            rotation,
            translation,
            valid: true,
            timestamp,
        }
    }

    /// Create an invalid pose sample at the given timestamp.
    pub fn invalid(timestamp: f64) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
            valid: false,
            timestamp,
        }
    }

    /// Convert the sample to a 4x4 rigid transform matrix.
    ///
    /// Invalid samples yield the identity.
    pub fn to_mat4(&self) -> Mat4 {
        if !self.valid {
            return Mat4::IDENTITY;
        }
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

impl Default for PoseSample {
    fn default() -> Self {
        Self::invalid(0.0)
    }
}

/// Rotation from the service world frame (Z up) to the render world frame
/// (Y up): -90 degrees about X.
pub fn gl_world_from_service() -> Mat4 {
    Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

/// Rotation from the physical camera frame (+Z forward, +Y down) to the
/// render camera frame (-Z forward, +Y up): 180 degrees about X.
pub fn camera_from_gl_camera() -> Mat4 {
    Mat4::from_rotation_x(std::f32::consts::PI)
}

/// Fixed rigid transforms between the IMU and the other sensor frames.
///
/// Queried once at connect time and held for the session; never mutated
/// afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtrinsicCalibration {
    /// Transform from the device frame into the IMU frame.
    pub imu_from_device: Mat4,
    /// Transform from the color camera frame into the IMU frame.
    pub imu_from_camera: Mat4,
}

impl ExtrinsicCalibration {
    /// Create a calibration from the two connect-time extrinsic queries.
    pub fn new(imu_from_device: Mat4, imu_from_camera: Mat4) -> Self {
        Self {
            imu_from_device,
            imu_from_camera,
        }
    }

    /// Compose a base-to-device pose into a camera-to-render-world transform.
    ///
    /// The full chain is
    /// `gl_world_from_service * service_from_device * device_from_imu *
    /// imu_from_camera * camera_from_gl_camera`, suitable for placing both
    /// the AR camera and the reconstructed point cloud in a stable Y-up
    /// world frame.
    pub fn compose_world_frame(&self, service_from_device: Mat4) -> Mat4 {
        gl_world_from_service()
            * service_from_device
            * self.imu_from_device.inverse()
            * self.imu_from_camera
            * camera_from_gl_camera()
    }
}

impl Default for ExtrinsicCalibration {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_pose_is_identity() {
        let pose = PoseSample::invalid(12.5);
        assert_eq!(pose.to_mat4(), Mat4::IDENTITY);
        assert_eq!(pose.timestamp, 12.5);
    }

    #[test]
    fn test_valid_pose_matrix() {
        let pose = PoseSample::new(Quat::IDENTITY, Vec3::new(1.0, 2.0, 3.0), 0.0);
        let m = pose.to_mat4();
        assert_relative_eq!(m.w_axis.x, 1.0);
        assert_relative_eq!(m.w_axis.y, 2.0);
        assert_relative_eq!(m.w_axis.z, 3.0);
    }

    #[test]
    fn test_gl_world_from_service_maps_z_up_to_y_up() {
        let up = gl_world_from_service().transform_vector3(Vec3::Z);
        assert_relative_eq!(up.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(up.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(up.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_identity_extrinsics_composition() {
        // with identity extrinsics only the axis conventions remain
        let calib = ExtrinsicCalibration::default();
        let composed = calib.compose_world_frame(Mat4::IDENTITY);
        let expected = gl_world_from_service() * camera_from_gl_camera();
        for (a, b) in composed
            .to_cols_array()
            .iter()
            .zip(expected.to_cols_array().iter())
        {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_invalid_pose_composition_is_identity_derived() {
        // an invalid sample composes exactly as the identity pose would
        let calib = ExtrinsicCalibration::new(
            Mat4::from_translation(Vec3::new(0.0, 0.1, 0.0)),
            Mat4::from_translation(Vec3::new(0.05, 0.0, 0.0)),
        );
        let composed = calib.compose_world_frame(PoseSample::invalid(1.0).to_mat4());
        let expected = calib.compose_world_frame(Mat4::IDENTITY);
        assert_eq!(composed, expected);
    }

    #[test]
    fn test_translation_carries_through() {
        let calib = ExtrinsicCalibration::default();
        let pose = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let composed = calib.compose_world_frame(pose);
        // service X stays the render world X under the Z-up to Y-up rotation
        assert_relative_eq!(composed.w_axis.x, 1.0, epsilon = 1e-6);
    }
}
