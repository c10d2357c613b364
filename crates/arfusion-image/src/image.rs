use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use arfusion_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Trait for image data types.
///
/// Provides the float casts used by the resampling and filtering kernels.
pub trait ImageDtype: Copy + Default + Send + Sync {
    /// Convert a f32 value to the image data type.
    fn from_f32(x: f32) -> Self;
    /// Convert the image data type to f32.
    fn to_f32(&self) -> f32;
}

impl ImageDtype for f32 {
    fn from_f32(x: f32) -> Self {
        x
    }

    fn to_f32(&self) -> f32 {
        *self
    }
}

impl ImageDtype for u8 {
    fn from_f32(x: f32) -> Self {
        x.round().clamp(0.0, 255.0) as u8
    }

    fn to_f32(&self) -> f32 {
        *self as f32
    }
}

/// Represents an image with pixel data.
///
/// The pixel data is stored row-major with interleaved channels, i.e. with
/// shape (H, W, C).
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS>
where
    T: ImageDtype,
{
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image, length `H * W * C`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match the image size.
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.width * size.height * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// Create a new image filled with a constant value.
    pub fn from_size_val(size: ImageSize, val: T) -> Self {
        Self {
            data: vec![val; size.width * size.height * CHANNELS],
            size,
        }
    }

    /// The size of the image in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// The height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The number of columns of the image.
    #[inline]
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// The number of rows of the image.
    #[inline]
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// The number of channels of the image.
    #[inline]
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Get the pixel data as a flat slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a mutable flat slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Fill the whole image with a constant value.
    pub fn fill(&mut self, val: T) {
        self.data.iter_mut().for_each(|x| *x = val);
    }

    /// Get the pixel values at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is out of bounds.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<[T; CHANNELS], ImageError> {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelOutOfBounds(
                x,
                y,
                self.size.width,
                self.size.height,
            ));
        }
        let idx = (y * self.size.width + x) * CHANNELS;
        let mut pixel = [T::default(); CHANNELS];
        pixel.copy_from_slice(&self.data[idx..idx + CHANNELS]);
        Ok(pixel)
    }

    /// Set the pixel values at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is out of bounds.
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: [T; CHANNELS]) -> Result<(), ImageError> {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelOutOfBounds(
                x,
                y,
                self.size.width,
                self.size.height,
            ));
        }
        let idx = (y * self.size.width + x) * CHANNELS;
        self.data[idx..idx + CHANNELS].copy_from_slice(&pixel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size() {
        let size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(size.width, 10);
        assert_eq!(size.height, 20);
    }

    #[test]
    fn test_image_new() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            vec![0u8; 2 * 3 * 3],
        )?;
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 3);
        assert_eq!(image.num_channels(), 3);
        Ok(())
    }

    #[test]
    fn test_image_new_wrong_shape() {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            vec![0u8; 5],
        );
        assert!(image.is_err());
    }

    #[test]
    fn test_get_set_pixel() -> Result<(), ImageError> {
        let mut image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 4,
                height: 2,
            },
            0,
        );
        image.set_pixel(3, 1, [7])?;
        assert_eq!(image.get_pixel(3, 1)?, [7]);
        assert!(image.get_pixel(4, 0).is_err());
        assert!(image.set_pixel(0, 2, [1]).is_err());
        Ok(())
    }

    #[test]
    fn test_fill() {
        let mut image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0,
        );
        image.fill(255);
        assert!(image.as_slice().iter().all(|&x| x == 255));
    }
}
