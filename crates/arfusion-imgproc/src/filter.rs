//! Image filtering operations.

use arfusion_image::{Image, ImageError};

fn check_same_size<const C: usize>(
    a: &Image<f32, C>,
    b: &Image<f32, C>,
) -> Result<(), ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            b.cols(),
            b.rows(),
            a.cols(),
            a.rows(),
        ));
    }
    Ok(())
}

/// Apply a box filter (windowed mean) to a single channel image.
///
/// Separable implementation: a horizontal mean pass into a temporary buffer
/// followed by a vertical mean pass. Windows are clamped at the image borders
/// and normalized by the actual number of samples, so border pixels are true
/// means rather than zero-padded ones.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image of the same size.
/// * `radius` - Half window size; the full window spans `2 * radius + 1`.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn box_blur(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    radius: usize,
) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    let (cols, rows) = (src.cols(), src.rows());
    let r = radius as isize;

    let src_data = src.as_slice();
    let mut temp = vec![0.0f32; src_data.len()];

    // horizontal pass
    for y in 0..rows {
        let row = y * cols;
        for x in 0..cols as isize {
            let x0 = (x - r).max(0) as usize;
            let x1 = ((x + r) as usize).min(cols - 1);
            let sum: f32 = src_data[row + x0..=row + x1].iter().sum();
            temp[row + x as usize] = sum / (x1 - x0 + 1) as f32;
        }
    }

    // vertical pass
    let dst_data = dst.as_slice_mut();
    for y in 0..rows as isize {
        let y0 = (y - r).max(0) as usize;
        let y1 = ((y + r) as usize).min(rows - 1);
        let count = (y1 - y0 + 1) as f32;
        for x in 0..cols {
            let mut sum = 0.0;
            for yy in y0..=y1 {
                sum += temp[yy * cols + x];
            }
            dst_data[y as usize * cols + x] = sum / count;
        }
    }

    Ok(())
}

/// Apply a guided filter to a single channel image.
///
/// Edge-aware joint filter: within each window the output is a linear
/// function `q = a * I + b` of the guide image `I`, with
/// `a = cov(I, p) / (var(I) + eps)`. Edges present in the guide steer the
/// smoothing of the filtered image, which is what lets an aligned grayscale
/// frame sharpen a sparse depth map.
///
/// # Arguments
///
/// * `guide` - The guide image, typically intensities in `[0, 1]`.
/// * `src` - The image to filter, same size as the guide.
/// * `dst` - The output image.
/// * `radius` - Box window radius for all the windowed means.
/// * `eps` - Regularization strength, in squared guide-intensity units; larger
///   values smooth more aggressively across weak edges.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn guided_filter(
    guide: &Image<f32, 1>,
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    radius: usize,
    eps: f32,
) -> Result<(), ImageError> {
    check_same_size(guide, src)?;
    check_same_size(src, dst)?;

    let size = src.size();
    let n = guide.as_slice().len();

    let mut mean_i = Image::<f32, 1>::from_size_val(size, 0.0);
    let mut mean_p = Image::<f32, 1>::from_size_val(size, 0.0);
    box_blur(guide, &mut mean_i, radius)?;
    box_blur(src, &mut mean_p, radius)?;

    let mut ip = Image::<f32, 1>::from_size_val(size, 0.0);
    let mut ii = Image::<f32, 1>::from_size_val(size, 0.0);
    for k in 0..n {
        let i = guide.as_slice()[k];
        ip.as_slice_mut()[k] = i * src.as_slice()[k];
        ii.as_slice_mut()[k] = i * i;
    }

    let mut mean_ip = Image::<f32, 1>::from_size_val(size, 0.0);
    let mut mean_ii = Image::<f32, 1>::from_size_val(size, 0.0);
    box_blur(&ip, &mut mean_ip, radius)?;
    box_blur(&ii, &mut mean_ii, radius)?;

    // per-window linear coefficients
    let mut a = Image::<f32, 1>::from_size_val(size, 0.0);
    let mut b = Image::<f32, 1>::from_size_val(size, 0.0);
    for k in 0..n {
        let mi = mean_i.as_slice()[k];
        let mp = mean_p.as_slice()[k];
        let cov = mean_ip.as_slice()[k] - mi * mp;
        let var = mean_ii.as_slice()[k] - mi * mi;
        let ak = cov / (var + eps);
        a.as_slice_mut()[k] = ak;
        b.as_slice_mut()[k] = mp - ak * mi;
    }

    let mut mean_a = Image::<f32, 1>::from_size_val(size, 0.0);
    let mut mean_b = Image::<f32, 1>::from_size_val(size, 0.0);
    box_blur(&a, &mut mean_a, radius)?;
    box_blur(&b, &mut mean_b, radius)?;

    for (k, out) in dst.as_slice_mut().iter_mut().enumerate() {
        *out = mean_a.as_slice()[k] * guide.as_slice()[k] + mean_b.as_slice()[k];
    }

    Ok(())
}
