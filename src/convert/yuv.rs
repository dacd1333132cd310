use std::time::Instant;

use tracing::{debug, warn};

use crate::frame::buffer::{try_zeroed, PackedBuffer};
use crate::frame::error::{FrameError, Result};
use crate::frame::outcome::Outcome;
use crate::frame::types::{FrameGeometry, PixelFormat};

/// Convert a planar YUV 4:2:0 frame into a packed RGBA buffer.
///
/// The U and V planes are first interleaved into a single NV21 chroma plane,
/// then the luma and chroma planes are converted with [`nv21_to_rgba`].
/// Every plane is bounds-checked against `geometry` before any sample is
/// read. On failure the outcome carries no buffer and nothing needs to be
/// released.
pub fn convert(y: &[u8], u: &[u8], v: &[u8], geometry: &FrameGeometry) -> Outcome<PackedBuffer> {
    let start = Instant::now();
    let outcome = Outcome::new(try_convert(y, u, v, geometry), start.elapsed());

    match outcome.error() {
        None => debug!(
            target: "edge_preview::convert",
            "converted {}x{} frame in {:.3}ms",
            geometry.width(),
            geometry.height(),
            outcome.elapsed_ms()
        ),
        Some(e) => warn!(
            target: "edge_preview::convert",
            "conversion of {}x{} frame failed after {:.3}ms: {e}",
            geometry.width(),
            geometry.height(),
            outcome.elapsed_ms()
        ),
    }
    outcome
}

fn try_convert(y: &[u8], u: &[u8], v: &[u8], geometry: &FrameGeometry) -> Result<PackedBuffer> {
    check_plane("Y", y, geometry.required_y_len())?;
    let vu = interleave_vu(u, v, geometry)?;

    let mut rgba =
        PackedBuffer::try_allocate(geometry.width(), geometry.height(), PixelFormat::Rgba8)?;
    nv21_to_rgba(y, &vu, geometry, rgba.as_bytes_mut());
    Ok(rgba)
}

fn check_plane(plane: &'static str, data: &[u8], required: usize) -> Result<()> {
    if data.len() < required {
        return Err(FrameError::PlaneTooShort {
            plane,
            len: data.len(),
            required,
        });
    }
    Ok(())
}

/// Interleave separate U and V planes into one NV21 plane.
///
/// Output rows hold `chroma_width` V,U pairs (V first) at a stride of
/// `2 * chroma_width` bytes. Source rows honour the geometry's chroma row
/// and pixel strides.
pub fn interleave_vu(u: &[u8], v: &[u8], geometry: &FrameGeometry) -> Result<Vec<u8>> {
    let required = geometry.required_uv_len();
    check_plane("U", u, required)?;
    check_plane("V", v, required)?;

    let chroma_width = geometry.chroma_width();
    let row_stride = geometry.uv_row_stride();
    let pixel_stride = geometry.uv_pixel_stride();

    let mut vu = try_zeroed(2 * chroma_width * geometry.chroma_height())?;
    for (row, out_row) in vu.chunks_exact_mut(2 * chroma_width).enumerate() {
        let base = row * row_stride;
        for (col, pair) in out_row.chunks_exact_mut(2).enumerate() {
            let src = base + col * pixel_stride;
            pair[0] = v[src];
            pair[1] = u[src];
        }
    }
    Ok(vu)
}

/// Convert a luma plane plus an NV21 chroma plane into RGBA.
///
/// `vu` must be laid out as produced by [`interleave_vu`] and `out` must hold
/// exactly `width * height * 4` bytes. Each 2x2 block of pixels shares one
/// V,U pair. Uses BT.601 conversion with fixed-point integer arithmetic
/// (<<8), alpha is always opaque.
pub fn nv21_to_rgba(y: &[u8], vu: &[u8], geometry: &FrameGeometry, out: &mut [u8]) {
    let width = geometry.width() as usize;
    let y_stride = geometry.y_row_stride();
    let vu_stride = 2 * geometry.chroma_width();

    for (row, out_row) in out.chunks_exact_mut(width * 4).enumerate() {
        let y_row = &y[row * y_stride..row * y_stride + width];
        let vu_row = &vu[(row / 2) * vu_stride..(row / 2 + 1) * vu_stride];

        for (col, (pixel, &luma)) in out_row.chunks_exact_mut(4).zip(y_row).enumerate() {
            let pair = (col / 2) * 2;
            let v = vu_row[pair] as i32 - 128;
            let u = vu_row[pair + 1] as i32 - 128;
            pixel.copy_from_slice(&yuv_to_rgba(luma as i32, u, v));
        }
    }
}

/// One pixel of the fixed-point BT.601 transform. `u` and `v` are centred on 0.
#[inline]
fn yuv_to_rgba(y: i32, u: i32, v: i32) -> [u8; 4] {
    [
        ((y * 256 + 359 * v) >> 8).clamp(0, 255) as u8,
        ((y * 256 - 88 * u - 183 * v) >> 8).clamp(0, 255) as u8,
        ((y * 256 + 454 * u) >> 8).clamp(0, 255) as u8,
        255,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform planes sized exactly for `geometry`.
    fn flat_planes(geometry: &FrameGeometry, y: u8, u: u8, v: u8) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        (
            vec![y; geometry.required_y_len()],
            vec![u; geometry.required_uv_len()],
            vec![v; geometry.required_uv_len()],
        )
    }

    #[test]
    fn converts_mid_grey_4x4() {
        let geometry = FrameGeometry::new(4, 4, 4, 2).unwrap();
        let (y, u, v) = flat_planes(&geometry, 128, 128, 128);

        let rgba = convert(&y, &u, &v, &geometry).into_value().unwrap();
        assert_eq!(rgba.len(), 4 * 4 * 4);
        assert_eq!(rgba.format(), PixelFormat::Rgba8);
        for pixel in rgba.as_bytes().chunks(4) {
            assert_eq!(pixel, [128, 128, 128, 255]);
        }
    }

    #[test]
    fn converts_black_and_white() {
        let geometry = FrameGeometry::tight(2, 2).unwrap();

        let (y, u, v) = flat_planes(&geometry, 0, 128, 128);
        let black = convert(&y, &u, &v, &geometry).into_value().unwrap();
        for pixel in black.as_bytes().chunks(4) {
            assert_eq!(pixel, [0, 0, 0, 255]);
        }

        let (y, u, v) = flat_planes(&geometry, 235, 128, 128);
        let white = convert(&y, &u, &v, &geometry).into_value().unwrap();
        for pixel in white.as_bytes().chunks(4) {
            assert_eq!(pixel, [235, 235, 235, 255]);
        }
    }

    #[test]
    fn strong_v_pushes_red() {
        // V well above centre: red up, green down, blue unchanged
        let geometry = FrameGeometry::tight(2, 2).unwrap();
        let (y, u, v) = flat_planes(&geometry, 128, 128, 228);
        let rgba = convert(&y, &u, &v, &geometry).into_value().unwrap();
        let pixel = &rgba.as_bytes()[..4];
        assert!(pixel[0] > 200, "red should rise, got {}", pixel[0]);
        assert!(pixel[1] < 128, "green should fall, got {}", pixel[1]);
        assert_eq!(pixel[2], 128);
    }

    #[test]
    fn output_size_matches_geometry_for_odd_and_padded_frames() {
        for (width, height, y_stride, uv_stride) in
            [(1, 1, 1, 1), (3, 5, 3, 2), (5, 3, 8, 4), (7, 7, 16, 16)]
        {
            let geometry = FrameGeometry::new(width, height, y_stride, uv_stride).unwrap();
            let (y, u, v) = flat_planes(&geometry, 90, 100, 110);
            let rgba = convert(&y, &u, &v, &geometry).into_value().unwrap();
            assert_eq!(rgba.len(), (width * height * 4) as usize);
        }
    }

    #[test]
    fn rejects_short_planes() {
        let geometry = FrameGeometry::new(4, 4, 6, 3).unwrap();
        let (y, u, v) = flat_planes(&geometry, 128, 128, 128);

        let outcome = convert(&y[..y.len() - 1], &u, &v, &geometry);
        assert!(matches!(
            outcome.error(),
            Some(FrameError::PlaneTooShort { plane: "Y", .. })
        ));

        let outcome = convert(&y, &u[..u.len() - 1], &v, &geometry);
        assert!(matches!(
            outcome.error(),
            Some(FrameError::PlaneTooShort { plane: "U", .. })
        ));

        let outcome = convert(&y, &u, &[], &geometry);
        assert!(matches!(
            outcome.error(),
            Some(FrameError::PlaneTooShort { plane: "V", .. })
        ));
        assert!(outcome.into_value().is_none());
    }

    #[test]
    fn huge_strides_are_rejected_without_panicking() {
        let planar = FrameGeometry::new(6, 2, 6, 3).unwrap();
        assert!(planar.with_uv_pixel_stride(1 << (usize::BITS - 1)).is_err());

        // Wide rows that no real plane can cover
        let geometry = FrameGeometry::new(6, 4, usize::MAX / 2, usize::MAX / 2).unwrap();
        let outcome = convert(&[128; 24], &[128; 6], &[128; 6], &geometry);
        assert!(matches!(
            outcome.error(),
            Some(FrameError::PlaneTooShort { plane: "Y", .. })
        ));

        let geometry = FrameGeometry::new(6, 4, 6, usize::MAX / 2).unwrap();
        let outcome = convert(&[128; 24], &[128; 6], &[128; 6], &geometry);
        assert!(matches!(
            outcome.error(),
            Some(FrameError::PlaneTooShort { plane: "U", .. })
        ));
        assert!(!outcome.is_success());
    }

    #[test]
    fn padding_bytes_are_ignored() {
        // Y rows padded with 255s and chroma rows padded with 0s must not
        // leak into the output
        let geometry = FrameGeometry::new(2, 2, 4, 3).unwrap();
        let y = vec![50, 50, 255, 255, 50, 50];
        let u = vec![128];
        let v = vec![128];
        let rgba = convert(&y, &u, &v, &geometry).into_value().unwrap();
        for pixel in rgba.as_bytes().chunks(4) {
            assert_eq!(pixel, [50, 50, 50, 255]);
        }
    }

    #[test]
    fn interleaves_v_before_u() {
        let geometry = FrameGeometry::new(4, 4, 4, 3).unwrap();
        // Chroma is 2x2 with one byte of row padding
        let u = vec![1, 2, 0, 3, 4];
        let v = vec![11, 12, 0, 13, 14];
        let vu = interleave_vu(&u, &v, &geometry).unwrap();
        assert_eq!(vu, vec![11, 1, 12, 2, 13, 3, 14, 4]);
    }

    #[test]
    fn interleave_honours_pixel_stride() {
        let geometry = FrameGeometry::new(4, 2, 4, 4)
            .unwrap()
            .with_uv_pixel_stride(2)
            .unwrap();
        let u = vec![1, 99, 2];
        let v = vec![11, 99, 12];
        let vu = interleave_vu(&u, &v, &geometry).unwrap();
        assert_eq!(vu, vec![11, 1, 12, 2]);
    }

    #[test]
    fn chroma_is_shared_per_2x2_block() {
        let geometry = FrameGeometry::tight(4, 2).unwrap();
        let y = vec![128; 8];
        // Left block neutral, right block strongly blue
        let u = vec![128, 228];
        let v = vec![128, 128];
        let rgba = convert(&y, &u, &v, &geometry).into_value().unwrap();
        let bytes = rgba.as_bytes();
        for row in 0..2 {
            let left = &bytes[row * 16..row * 16 + 8];
            let right = &bytes[row * 16 + 8..row * 16 + 16];
            assert_eq!(left, [128, 128, 128, 255, 128, 128, 128, 255]);
            assert_eq!(right[0..4], right[4..8]);
            assert!(right[2] > 200);
        }
    }

    #[test]
    fn input_planes_are_untouched() {
        let geometry = FrameGeometry::tight(2, 2).unwrap();
        let (y, u, v) = flat_planes(&geometry, 10, 20, 30);
        let before = (y.clone(), u.clone(), v.clone());
        let _ = convert(&y, &u, &v, &geometry);
        assert_eq!((y, u, v), before);
    }
}
