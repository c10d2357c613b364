//! Sensor service abstraction and frame types.
//!
//! The hardware SDK delivers depth batches and color frames through
//! callbacks and answers pose and intrinsics queries. The pipeline consumes
//! it through the [`SensorService`] capability trait so the whole stack can
//! run against synthetic sources in tests.

use arfusion_3d::camera::PinholeCameraIntrinsic;
use arfusion_3d::pose::{CoordinateFrame, PoseSample};

use crate::error::PipelineError;

/// The physical cameras a sensor service exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraKind {
    /// The color camera.
    Color,
    /// The depth camera.
    Depth,
}

/// Pixel format tag of a color frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUV 4:2:0 semi-planar, interleaved chroma with V first (NV21 style).
    Yuv420Sp,
    /// Packed 32-bit RGBA.
    Rgba8888,
    /// Anything the pipeline does not understand.
    Unknown,
}

/// A borrowed color frame as delivered by the color callback.
///
/// Transient: the pipeline copies what it needs during the callback and the
/// buffer is not retained.
#[derive(Clone, Copy, Debug)]
pub struct ColorFrame<'a> {
    /// The raw pixel buffer.
    pub data: &'a [u8],
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Pixel format of `data`.
    pub format: PixelFormat,
    /// Acquisition timestamp, in seconds.
    pub timestamp: f64,
}

/// An opaque status or debug event emitted by the sensor service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventSample {
    /// Event timestamp, in seconds.
    pub timestamp: f64,
    /// Human readable event description.
    pub message: String,
}

/// Capability interface over the external sensor/tracking service.
///
/// Implementations must answer pose queries for arbitrary timestamps and
/// frame pairs, and report per-camera intrinsics. Query failures are
/// `Err`; a pose the tracker could not resolve is `Ok` with `valid == false`.
pub trait SensorService: Send + Sync {
    /// Query the pose relating `base` to `target` at a timestamp.
    fn pose_at(
        &self,
        timestamp: f64,
        base: CoordinateFrame,
        target: CoordinateFrame,
    ) -> Result<PoseSample, PipelineError>;

    /// Query the intrinsics of one of the physical cameras.
    fn camera_intrinsics(&self, camera: CameraKind)
        -> Result<PinholeCameraIntrinsic, PipelineError>;
}
