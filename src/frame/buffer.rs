use std::fmt;

use tracing::{trace, warn};

use crate::frame::error::{FrameError, Result};
use crate::frame::types::PixelFormat;

/// Owned, row-major pixel buffer with no row padding.
///
/// A `PackedBuffer` has exactly one owner. It cannot be cloned, and
/// [`release`](Self::release) consumes it, so a released buffer can never be
/// touched or released again. `Option<PackedBuffer>` stands in for the
/// "no buffer" sentinel.
pub struct PackedBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl PackedBuffer {
    /// Allocate a zero-filled buffer.
    ///
    /// Returns `None` for a zero width or height, or when the allocation
    /// itself fails.
    pub fn allocate(width: u32, height: u32, format: PixelFormat) -> Option<Self> {
        match Self::try_allocate(width, height, format) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                warn!(target: "edge_preview::buffer", "allocate {width}x{height} {format:?} failed: {e}");
                None
            }
        }
    }

    pub(crate) fn try_allocate(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or(FrameError::Allocation(usize::MAX))?;

        let data = try_zeroed(len)?;

        trace!(target: "edge_preview::buffer", "allocated {width}x{height} {format:?} ({len} bytes)");
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Wrap existing pixel data. The length must match the dimensions exactly.
    pub fn from_vec(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }
        let required = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != required {
            return Err(FrameError::PlaneTooShort {
                plane: "packed",
                len: data.len(),
                required,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Give up the handle and keep the bytes, e.g. for handing to a display.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Free the buffer. Consumes the handle.
    pub fn release(self) {
        trace!(
            target: "edge_preview::buffer",
            "released {}x{} {:?}",
            self.width,
            self.height,
            self.format
        );
    }
}

impl fmt::Debug for PackedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Zero-filled byte vector that reports allocation failure instead of aborting.
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FrameError::Allocation(len))?;
    data.resize(len, 0);
    Ok(data)
}

/// Release a possibly absent buffer. `None` is a no-op.
pub fn release(handle: Option<PackedBuffer>) {
    if let Some(buffer) = handle {
        buffer.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_zero_size_returns_none() {
        assert!(PackedBuffer::allocate(0, 0, PixelFormat::Rgba8).is_none());
        assert!(PackedBuffer::allocate(0, 4, PixelFormat::Rgba8).is_none());
        assert!(PackedBuffer::allocate(4, 0, PixelFormat::Gray8).is_none());
    }

    #[test]
    fn allocate_sizes_by_format() {
        let rgba = PackedBuffer::allocate(3, 2, PixelFormat::Rgba8).unwrap();
        assert_eq!(rgba.len(), 24);
        assert!(rgba.as_bytes().iter().all(|&b| b == 0));

        let gray = PackedBuffer::allocate(3, 2, PixelFormat::Gray8).unwrap();
        assert_eq!(gray.len(), 6);
    }

    #[test]
    fn allocate_absurd_size_fails_without_aborting() {
        assert!(PackedBuffer::allocate(u32::MAX, u32::MAX, PixelFormat::Rgba8).is_none());
    }

    #[test]
    fn release_none_is_noop() {
        release(None);
    }

    #[test]
    fn release_some_consumes_buffer() {
        let buffer = PackedBuffer::allocate(2, 2, PixelFormat::Rgba8);
        release(buffer);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(PackedBuffer::from_vec(2, 2, PixelFormat::Rgba8, vec![0; 16]).is_ok());
        assert!(PackedBuffer::from_vec(2, 2, PixelFormat::Rgba8, vec![0; 15]).is_err());
        assert!(PackedBuffer::from_vec(0, 2, PixelFormat::Rgba8, vec![]).is_err());
    }

    #[test]
    fn packed_buffer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PackedBuffer>();
    }
}
