//! Image resize operations.

use arfusion_image::{Image, ImageDtype, ImageError};
use rayon::prelude::*;

/// Interpolation mode for the resize operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Bilinear interpolation.
    Bilinear,
    /// Nearest neighbor interpolation.
    Nearest,
}

/// Kernel for bilinear interpolation.
///
/// Samples the four neighboring pixels of the continuous coordinate `(u, v)`
/// and blends them by their fractional weights.
#[inline]
fn bilinear_interpolation<const C: usize>(
    data: &[f32],
    cols: usize,
    rows: usize,
    u: f32,
    v: f32,
) -> [f32; C] {
    let iu0 = (u.trunc() as usize).min(cols - 1);
    let iv0 = (v.trunc() as usize).min(rows - 1);
    let iu1 = (iu0 + 1).min(cols - 1);
    let iv1 = (iv0 + 1).min(rows - 1);

    let frac_u = u.fract();
    let frac_v = v.fract();

    let w00 = (1.0 - frac_u) * (1.0 - frac_v);
    let w01 = frac_u * (1.0 - frac_v);
    let w10 = (1.0 - frac_u) * frac_v;
    let w11 = frac_u * frac_v;

    let base00 = (iv0 * cols + iu0) * C;
    let base01 = (iv0 * cols + iu1) * C;
    let base10 = (iv1 * cols + iu0) * C;
    let base11 = (iv1 * cols + iu1) * C;

    let mut pixel = [0.0; C];
    for (k, p) in pixel.iter_mut().enumerate() {
        *p = data[base00 + k] * w00
            + data[base01 + k] * w01
            + data[base10 + k] * w10
            + data[base11 + k] * w11;
    }
    pixel
}

/// Kernel for nearest neighbor interpolation.
#[inline]
fn nearest_interpolation<const C: usize>(
    data: &[f32],
    cols: usize,
    rows: usize,
    u: f32,
    v: f32,
) -> [f32; C] {
    let iu = (u.round() as usize).min(cols - 1);
    let iv = (v.round() as usize).min(rows - 1);
    let base = (iv * cols + iu) * C;

    let mut pixel = [0.0; C];
    pixel.copy_from_slice(&data[base..base + C]);
    pixel
}

/// Resize an image to a new size.
///
/// This is a resampling operation, not a crop: every output pixel maps back
/// to a continuous source coordinate spanning the full source extent and is
/// interpolated there.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, allocated at the target size.
/// * `interpolation` - The interpolation mode to use.
///
/// # Errors
///
/// Returns an error if either image is empty.
///
/// # Example
///
/// ```
/// use arfusion_image::{Image, ImageSize};
/// use arfusion_imgproc::resize::{resize_native, InterpolationMode};
///
/// let image = Image::<u8, 1>::new(
///     ImageSize {
///         width: 4,
///         height: 4,
///     },
///     vec![0u8; 4 * 4],
/// )
/// .unwrap();
///
/// let mut resized = Image::<u8, 1>::from_size_val(
///     ImageSize {
///         width: 2,
///         height: 2,
///     },
///     0,
/// );
///
/// resize_native(&image, &mut resized, InterpolationMode::Bilinear).unwrap();
/// assert_eq!(resized.size().width, 2);
/// ```
pub fn resize_native<T, const CHANNELS: usize>(
    src: &Image<T, CHANNELS>,
    dst: &mut Image<T, CHANNELS>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.width() == 0 || src.height() == 0 || dst.width() == 0 || dst.height() == 0 {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (src_cols, src_rows) = (src.cols(), src.rows());
    let (dst_cols, dst_rows) = (dst.cols(), dst.rows());

    // map the output grid onto the full source extent
    let step_x = if dst_cols > 1 {
        (src_cols - 1) as f32 / (dst_cols - 1) as f32
    } else {
        0.0
    };
    let step_y = if dst_rows > 1 {
        (src_rows - 1) as f32 / (dst_rows - 1) as f32
    } else {
        0.0
    };

    let src_data: Vec<f32> = src.as_slice().iter().map(|x| x.to_f32()).collect();

    dst.as_slice_mut()
        .par_chunks_mut(dst_cols * CHANNELS)
        .enumerate()
        .for_each(|(r, row)| {
            let v = r as f32 * step_y;
            for c in 0..dst_cols {
                let u = c as f32 * step_x;
                let pixel = match interpolation {
                    InterpolationMode::Bilinear => {
                        bilinear_interpolation::<CHANNELS>(&src_data, src_cols, src_rows, u, v)
                    }
                    InterpolationMode::Nearest => {
                        nearest_interpolation::<CHANNELS>(&src_data, src_cols, src_rows, u, v)
                    }
                };
                for (k, &p) in pixel.iter().enumerate() {
                    row[c * CHANNELS + k] = T::from_f32(p);
                }
            }
        });

    Ok(())
}
