use serde::{Deserialize, Serialize};

use crate::frame::error::{FrameError, Result};

/// Pixel layouts a [`PackedBuffer`](crate::frame::buffer::PackedBuffer) can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Four interleaved 8-bit channels, R, G, B, A.
    Rgba8,
    /// Single 8-bit intensity channel.
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Gray8 => 1,
        }
    }
}

/// Layout of a planar YUV 4:2:0 frame.
///
/// The luma plane is full resolution; both chroma planes are subsampled by
/// two in each axis, rounding up for odd dimensions. Row strides may exceed
/// the logical row width when the capture source pads rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameGeometry {
    width: u32,
    height: u32,
    y_row_stride: usize,
    uv_row_stride: usize,
    uv_pixel_stride: usize,
}

impl FrameGeometry {
    /// Create a geometry for fully planar chroma (pixel stride 1).
    pub fn new(width: u32, height: u32, y_row_stride: usize, uv_row_stride: usize) -> Result<Self> {
        let geometry = Self {
            width,
            height,
            y_row_stride,
            uv_row_stride,
            uv_pixel_stride: 1,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Geometry with no row padding.
    pub fn tight(width: u32, height: u32) -> Result<Self> {
        let chroma_width = (width as usize).div_ceil(2);
        Self::new(width, height, width as usize, chroma_width)
    }

    /// Use a chroma pixel stride other than 1.
    ///
    /// Camera stacks frequently hand out U and V as views into one
    /// semi-planar buffer, in which case consecutive chroma samples are two
    /// bytes apart.
    pub fn with_uv_pixel_stride(self, uv_pixel_stride: usize) -> Result<Self> {
        if uv_pixel_stride == 0 {
            return Err(FrameError::StrideTooSmall {
                plane: "UV pixel",
                stride: 0,
                min: 1,
            });
        }
        let geometry = Self {
            uv_pixel_stride,
            ..self
        };
        geometry.validate()?;
        Ok(geometry)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.y_row_stride < self.width as usize {
            return Err(FrameError::StrideTooSmall {
                plane: "Y",
                stride: self.y_row_stride,
                min: self.width as usize,
            });
        }
        let min_uv = self
            .chroma_row_span()
            .ok_or(FrameError::StrideOverflow {
                plane: "UV pixel",
                stride: self.uv_pixel_stride,
            })?;
        if self.uv_row_stride < min_uv {
            return Err(FrameError::StrideTooSmall {
                plane: "UV",
                stride: self.uv_row_stride,
                min: min_uv,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn y_row_stride(&self) -> usize {
        self.y_row_stride
    }

    pub fn uv_row_stride(&self) -> usize {
        self.uv_row_stride
    }

    pub fn uv_pixel_stride(&self) -> usize {
        self.uv_pixel_stride
    }

    /// Chroma samples per row, `ceil(width / 2)`.
    pub fn chroma_width(&self) -> usize {
        (self.width as usize).div_ceil(2)
    }

    /// Chroma rows, `ceil(height / 2)`.
    pub fn chroma_height(&self) -> usize {
        (self.height as usize).div_ceil(2)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Minimum Y plane length: the last row only needs `width` bytes.
    pub fn required_y_len(&self) -> usize {
        self.y_row_stride
            .saturating_mul(self.height as usize - 1)
            .saturating_add(self.width as usize)
    }

    /// Bytes spanned by one chroma row's samples, `None` on overflow.
    fn chroma_row_span(&self) -> Option<usize> {
        (self.chroma_width() - 1)
            .checked_mul(self.uv_pixel_stride)?
            .checked_add(1)
    }

    /// Minimum length of each chroma plane.
    pub fn required_uv_len(&self) -> usize {
        let last_row = self.chroma_row_span().unwrap_or(usize::MAX);
        self.uv_row_stride
            .saturating_mul(self.chroma_height() - 1)
            .saturating_add(last_row)
    }

    /// Byte length of the packed buffer this frame converts into.
    pub fn packed_len(&self, format: PixelFormat) -> usize {
        self.pixel_count().saturating_mul(format.bytes_per_pixel())
    }
}
