//! Pose and extrinsics management.

use std::sync::{Arc, Mutex, OnceLock};

use arfusion_3d::pose::{CoordinateFrame, ExtrinsicCalibration, PoseSample};
use glam::Mat4;

use crate::error::PipelineError;
use crate::source::SensorService;

/// Thread-safe cache of the latest device pose plus the session extrinsics.
///
/// External pose queries run outside the lock; the mutex protects only the
/// cached sample copy, so readers (debug string, render loop) and the writer
/// never interleave a partial update. The extrinsics are written once at
/// connect time and read without locking afterwards.
pub struct PoseManager<S: SensorService> {
    service: Arc<S>,
    latest: Mutex<PoseSample>,
    extrinsics: OnceLock<ExtrinsicCalibration>,
}

impl<S: SensorService> PoseManager<S> {
    /// Create a manager backed by the given sensor service.
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            latest: Mutex::new(PoseSample::default()),
            extrinsics: OnceLock::new(),
        }
    }

    /// Query the IMU extrinsics once after connecting to the service.
    ///
    /// Uses the conventional timestamp 0.0 reference queries for the
    /// IMU-to-device and IMU-to-color-camera transforms and stores them for
    /// the session. A failure here makes all later geometry placement
    /// meaningless and is surfaced as [`PipelineError::CalibrationFailed`].
    pub fn calibrate_extrinsics(&self) -> Result<(), PipelineError> {
        let imu_from_device = self
            .service
            .pose_at(0.0, CoordinateFrame::Imu, CoordinateFrame::Device)
            .map_err(|e| {
                PipelineError::CalibrationFailed(format!("IMU to device query failed: {e}"))
            })?;
        let imu_from_camera = self
            .service
            .pose_at(0.0, CoordinateFrame::Imu, CoordinateFrame::CameraColor)
            .map_err(|e| {
                PipelineError::CalibrationFailed(format!("IMU to color camera query failed: {e}"))
            })?;

        if !imu_from_device.valid || !imu_from_camera.valid {
            return Err(PipelineError::CalibrationFailed(
                "service reported invalid extrinsic pose".to_string(),
            ));
        }

        let _ = self.extrinsics.set(ExtrinsicCalibration::new(
            imu_from_device.to_mat4(),
            imu_from_camera.to_mat4(),
        ));
        Ok(())
    }

    /// Whether the extrinsics have been calibrated.
    pub fn is_calibrated(&self) -> bool {
        self.extrinsics.get().is_some()
    }

    /// Query the start-of-service to device pose at a timestamp.
    ///
    /// On query failure or an invalid sample the identity matrix is
    /// substituted; the failure is logged, never propagated. A valid sample
    /// is cached as the latest pose under the pose mutex.
    pub fn pose_matrix_at(&self, timestamp: f64) -> Mat4 {
        let sample = match self.service.pose_at(
            timestamp,
            CoordinateFrame::StartOfService,
            CoordinateFrame::Device,
        ) {
            Ok(sample) => sample,
            Err(e) => {
                log::error!("failed to query pose at timestamp {timestamp}: {e}");
                PoseSample::invalid(timestamp)
            }
        };

        // held only for the copy, the query above ran unlocked
        *self.latest.lock().unwrap() = sample;

        if !sample.valid {
            log::warn!("invalid pose at timestamp {timestamp}, substituting identity");
        }
        sample.to_mat4()
    }

    /// Compose the pose at a timestamp into the render world frame.
    ///
    /// Before calibration the composition falls back to identity extrinsics.
    pub fn world_frame_at(&self, timestamp: f64) -> Mat4 {
        let pose = self.pose_matrix_at(timestamp);
        let extrinsics = match self.extrinsics.get() {
            Some(extrinsics) => *extrinsics,
            None => {
                log::warn!("world frame requested before extrinsics calibration");
                ExtrinsicCalibration::default()
            }
        };
        extrinsics.compose_world_frame(pose)
    }

    /// Format the latest cached pose for debugging.
    pub fn pose_debug_string(&self) -> String {
        let latest = self.latest.lock().unwrap();
        format!(
            "pose @ {:.3}s valid={} t=({:.3}, {:.3}, {:.3})",
            latest.timestamp,
            latest.valid,
            latest.translation.x,
            latest.translation.y,
            latest.translation.z,
        )
    }

    /// Reset the cached pose to an invalid sample.
    pub fn reset(&self) {
        let mut latest = self.latest.lock().unwrap();
        *latest = PoseSample::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arfusion_3d::camera::PinholeCameraIntrinsic;
    use arfusion_3d::pose::{camera_from_gl_camera, gl_world_from_service};
    use crate::source::CameraKind;
    use glam::{Quat, Vec3};

    struct FakeService {
        fail_extrinsics: bool,
        invalid_pose: bool,
    }

    impl SensorService for FakeService {
        fn pose_at(
            &self,
            timestamp: f64,
            base: CoordinateFrame,
            _target: CoordinateFrame,
        ) -> Result<PoseSample, PipelineError> {
            if base == CoordinateFrame::Imu {
                if self.fail_extrinsics {
                    return Err(PipelineError::PoseQueryFailed("no imu".to_string()));
                }
                return Ok(PoseSample::new(Quat::IDENTITY, Vec3::ZERO, 0.0));
            }
            if self.invalid_pose {
                return Ok(PoseSample::invalid(timestamp));
            }
            Ok(PoseSample::new(
                Quat::IDENTITY,
                Vec3::new(timestamp as f32, 0.0, 0.0),
                timestamp,
            ))
        }

        fn camera_intrinsics(
            &self,
            _camera: CameraKind,
        ) -> Result<PinholeCameraIntrinsic, PipelineError> {
            Ok(PinholeCameraIntrinsic::new(
                (240.0, 240.0),
                (160.0, 90.0),
                (320, 180),
            ))
        }
    }

    #[test]
    fn test_calibration_failure_is_fatal() {
        let manager = PoseManager::new(Arc::new(FakeService {
            fail_extrinsics: true,
            invalid_pose: false,
        }));
        let err = manager.calibrate_extrinsics().unwrap_err();
        assert!(matches!(err, PipelineError::CalibrationFailed(_)));
        assert!(!manager.is_calibrated());
    }

    #[test]
    fn test_invalid_pose_composes_identity_derived() {
        let manager = PoseManager::new(Arc::new(FakeService {
            fail_extrinsics: false,
            invalid_pose: true,
        }));
        manager.calibrate_extrinsics().unwrap();
        assert_eq!(manager.pose_matrix_at(1.0), Mat4::IDENTITY);
        // with identity extrinsics only the fixed axis conventions remain
        let world = manager.world_frame_at(1.0);
        assert_eq!(world, gl_world_from_service() * camera_from_gl_camera());
    }

    #[test]
    fn test_latest_pose_cached() {
        let manager = PoseManager::new(Arc::new(FakeService {
            fail_extrinsics: false,
            invalid_pose: false,
        }));
        manager.pose_matrix_at(2.5);
        let debug = manager.pose_debug_string();
        assert!(debug.contains("2.500"), "{debug}");
        assert!(debug.contains("valid=true"), "{debug}");
    }

    #[test]
    fn test_reset_clears_cache() {
        let manager = PoseManager::new(Arc::new(FakeService {
            fail_extrinsics: false,
            invalid_pose: false,
        }));
        manager.pose_matrix_at(2.5);
        manager.reset();
        assert!(manager.pose_debug_string().contains("valid=false"));
    }
}
