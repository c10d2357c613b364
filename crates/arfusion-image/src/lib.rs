#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for image containers.
mod error;
pub use error::ImageError;

/// Image container and pixel traits.
mod image;
pub use image::{Image, ImageDtype, ImageSize};

/// Plane conversion operations.
pub mod ops;
