#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pipeline error types.
mod error;
pub use error::PipelineError;

/// Frame synchronization gate.
pub mod gate;

/// Pose and extrinsics management.
pub mod pose;

/// Fusion session owning the pipeline state.
pub mod session;

/// Sensor service abstraction and frame types.
pub mod source;

#[doc(inline)]
pub use arfusion_image as image;

#[doc(inline)]
pub use arfusion_imgproc as imgproc;

#[doc(inline)]
pub use arfusion_3d as a3d;
