use arfusion_image::ImageError;

/// An error type for the fusion pipeline.
///
/// Dropped frames and invalid poses are normal outcomes, not errors; they are
/// reported through `FrameStatus` and identity fallbacks respectively.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The connect-time extrinsics calibration failed.
    ///
    /// All subsequent geometry placement is meaningless without extrinsics,
    /// so this is surfaced to the caller as a hard failure.
    #[error("Extrinsics calibration failed: {0}")]
    CalibrationFailed(String),

    /// An external pose query failed outright.
    #[error("Pose query failed: {0}")]
    PoseQueryFailed(String),

    /// Querying camera intrinsics from the sensor service failed.
    #[error("Camera intrinsics query failed: {0}")]
    IntrinsicsQueryFailed(String),

    /// An image operation inside the pipeline failed.
    #[error(transparent)]
    Image(#[from] ImageError),
}
