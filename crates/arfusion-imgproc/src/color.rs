//! Color transformations.

use arfusion_image::{Image, ImageError, ImageSize};

/// Convert a single YUV sample to RGB.
///
/// BT.601-derived linear combination, matching the constants used by the
/// camera HAL this pipeline was tuned against.
#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.370705 * v;
    let g = y - 0.698001 * v - 0.337633 * u;
    let b = y + 1.732446 * u;

    [
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ]
}

/// Convert a YUV 4:2:0 semi-planar buffer to an RGB image.
///
/// The buffer layout is a full-resolution luma plane followed by one
/// half-resolution plane of interleaved chroma pairs, V before U (NV21
/// style). Chroma is subsampled 2x in both axes: each luma sample at an odd
/// column reuses the chroma pair of the preceding even column, and the
/// chroma row index is the luma row divided by two.
///
/// # Arguments
///
/// * `src` - The raw semi-planar buffer, at least `w * h + w * h / 2` bytes.
/// * `size` - The luma plane dimensions; width and height must be even.
/// * `dst` - The output RGB image of the same dimensions.
///
/// # Errors
///
/// Returns an error if the dimensions are odd, the buffer is too short or
/// the sizes do not match.
pub fn yuv420sp_to_rgb(
    src: &[u8],
    size: ImageSize,
    dst: &mut Image<u8, 3>,
) -> Result<(), ImageError> {
    let (w, h) = (size.width, size.height);
    // 2x chroma subsampling requires even dimensions; an odd height would
    // send the last luma row past the end of the chroma plane
    if w % 2 != 0 || h % 2 != 0 {
        return Err(ImageError::OddImageSize(w, h));
    }
    let expected = w * h + w * h / 2;
    if src.len() < expected {
        return Err(ImageError::InvalidChannelShape(src.len(), expected));
    }
    if dst.size() != size {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            w,
            h,
        ));
    }

    let uv_offset = w * h;
    let dst_data = dst.as_slice_mut();

    for y in 0..h {
        let chroma_row = uv_offset + (y / 2) * w;
        for x in 0..w {
            // odd columns reuse the chroma pair of the preceding even column
            let x_index = x & !1;
            let v = src[chroma_row + x_index];
            let u = src[chroma_row + x_index + 1];
            let luma = src[y * w + x];

            let rgb = yuv_to_rgb(luma, u, v);
            let idx = (y * w + x) * 3;
            dst_data[idx..idx + 3].copy_from_slice(&rgb);
        }
    }

    Ok(())
}

/// Convert an RGB image to grayscale.
///
/// Uses the standard luma weights `0.299 R + 0.587 G + 0.114 B`.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn gray_from_rgb(src: &Image<u8, 3>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }

    let src_data = src.as_slice();
    for (i, out) in dst.as_slice_mut().iter_mut().enumerate() {
        let idx = i * 3;
        let gray = 0.299 * src_data[idx] as f32
            + 0.587 * src_data[idx + 1] as f32
            + 0.114 * src_data[idx + 2] as f32;
        *out = gray.round().clamp(0.0, 255.0) as u8;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_neutral_chroma_is_gray() {
        // u = v = 128 cancels every chroma term
        assert_eq!(yuv_to_rgb(0, 128, 128), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(128, 128, 128), [128, 128, 128]);
        assert_eq!(yuv_to_rgb(255, 128, 128), [255, 255, 255]);
    }

    #[test]
    fn test_yuv_red_push() {
        // max V pulls red up and green down
        let [r, g, b] = yuv_to_rgb(128, 128, 255);
        assert!(r > 128);
        assert!(g < 128);
        assert_eq!(b, 128);
    }

    #[test]
    fn test_yuv420sp_to_rgb_flat() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 2,
        };
        // luma 100 everywhere, neutral chroma (VU interleaved)
        let mut buf = vec![100u8; 4 * 2];
        buf.extend_from_slice(&[128u8; 4]);

        let mut rgb = Image::<u8, 3>::from_size_val(size, 0);
        yuv420sp_to_rgb(&buf, size, &mut rgb)?;
        assert!(rgb.as_slice().iter().all(|&x| x == 100));
        Ok(())
    }

    #[test]
    fn test_yuv420sp_chroma_pairing() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 2,
        };
        let mut buf = vec![128u8; 4 * 2];
        // two chroma pairs: columns 0-1 share the first, 2-3 the second
        buf.extend_from_slice(&[255, 128, 128, 128]);

        let mut rgb = Image::<u8, 3>::from_size_val(size, 0);
        yuv420sp_to_rgb(&buf, size, &mut rgb)?;

        // the red push from V=255 applies to columns 0 and 1 of both rows
        for y in 0..2 {
            let warm = rgb.get_pixel(0, y)?;
            assert_eq!(warm, rgb.get_pixel(1, y)?);
            assert!(warm[0] > 128);
            let neutral = rgb.get_pixel(2, y)?;
            assert_eq!(neutral, [128, 128, 128]);
            assert_eq!(neutral, rgb.get_pixel(3, y)?);
        }
        Ok(())
    }

    #[test]
    fn test_yuv420sp_short_buffer() {
        let size = ImageSize {
            width: 4,
            height: 2,
        };
        let buf = vec![0u8; 4];
        let mut rgb = Image::<u8, 3>::from_size_val(size, 0);
        assert!(yuv420sp_to_rgb(&buf, size, &mut rgb).is_err());
    }

    #[test]
    fn test_yuv420sp_odd_dimensions_rejected() {
        // 4x3 passes the length check (12 + 6 = 18 bytes) but the third
        // luma row has no chroma row of its own
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let buf = vec![128u8; 18];
        let mut rgb = Image::<u8, 3>::from_size_val(size, 0);
        assert!(matches!(
            yuv420sp_to_rgb(&buf, size, &mut rgb),
            Err(ImageError::OddImageSize(4, 3))
        ));

        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let buf = vec![128u8; 9];
        let mut rgb = Image::<u8, 3>::from_size_val(size, 0);
        assert!(yuv420sp_to_rgb(&buf, size, &mut rgb).is_err());
    }

    #[test]
    fn test_gray_from_rgb() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let rgb = Image::<u8, 3>::new(size, vec![255, 0, 0, 0, 255, 0])?;
        let mut gray = Image::<u8, 1>::from_size_val(size, 0);
        gray_from_rgb(&rgb, &mut gray)?;
        assert_eq!(gray.as_slice(), &[76, 150]);
        Ok(())
    }
}
