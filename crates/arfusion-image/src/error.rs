/// An error type for the image module.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image sizes of an operation do not match.
    #[error("Invalid image size ({0}x{1}), expected ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel coordinate falls outside the image.
    #[error("Pixel coordinate ({0}, {1}) is out of bounds ({2}x{3})")]
    PixelOutOfBounds(usize, usize, usize, usize),

    /// Error when an operation requires even image dimensions.
    #[error("Image size ({0}x{1}) must have even width and height")]
    OddImageSize(usize, usize),
}
