#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera model.
pub mod camera;

/// Pose samples, extrinsics and world frame composition.
pub mod pose;

/// Point cloud to depth image rasterization.
pub mod rasterize;

/// Depth image to point cloud reconstruction.
pub mod reconstruct;
