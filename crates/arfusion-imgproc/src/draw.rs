//! Drawing utilities.

use arfusion_image::{Image, ImageDtype};

/// Set a pixel's color, handling bounds checking.
#[inline]
fn set_pixel<T: ImageDtype, const C: usize>(img: &mut Image<T, C>, x: i64, y: i64, color: [T; C]) {
    if x >= 0 && x < img.cols() as i64 && y >= 0 && y < img.rows() as i64 {
        let start = (y as usize * img.cols() + x as usize) * C;
        img.as_slice_mut()[start..start + C].copy_from_slice(&color);
    }
}

/// Draw a filled square splat centered on a point.
///
/// Writes a `thickness x thickness` block around `(x, y)`; every write is
/// bounds checked and out-of-image pixels are silently skipped. Used to
/// densify sparse samples when rasterizing a point cloud into an image.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p` - The center point as (x, y).
/// * `color` - The color of the splat as an array of `C` elements.
/// * `thickness` - The side length of the splat in pixels.
pub fn draw_point_splat<T: ImageDtype, const C: usize>(
    img: &mut Image<T, C>,
    p: (i64, i64),
    color: [T; C],
    thickness: usize,
) {
    let (x, y) = p;
    let half = thickness as i64 / 2;
    for dy in -half..=half {
        for dx in -half..=half {
            set_pixel(img, x + dx, y + dy, color);
        }
    }
}
