use thiserror::Error;

use crate::frame::types::PixelFormat;

/// Frame conversion and processing errors.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("{plane} row stride {stride} is smaller than the minimum {min}")]
    StrideTooSmall {
        plane: &'static str,
        stride: usize,
        min: usize,
    },

    #[error("{plane} stride {stride} addresses past the end of memory")]
    StrideOverflow { plane: &'static str, stride: usize },

    #[error("{plane} plane holds {len} bytes, at least {required} required")]
    PlaneTooShort {
        plane: &'static str,
        len: usize,
        required: usize,
    },

    #[error("no buffer supplied")]
    MissingBuffer,

    #[error("buffer is empty")]
    EmptyBuffer,

    #[error("unsupported pixel format: {0:?}")]
    UnsupportedFormat(PixelFormat),

    #[error("failed to allocate {0} bytes")]
    Allocation(usize),

    #[error("invalid processor settings: {0}")]
    InvalidSettings(String),

    #[error("image processing failed: {0}")]
    Processing(String),
}

impl FrameError {
    /// Whether the error stems from bad caller input rather than a failure
    /// inside a conversion or filter step.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::ZeroDimension { .. }
                | Self::StrideTooSmall { .. }
                | Self::StrideOverflow { .. }
                | Self::PlaneTooShort { .. }
                | Self::MissingBuffer
                | Self::EmptyBuffer
                | Self::UnsupportedFormat(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FrameError>;
