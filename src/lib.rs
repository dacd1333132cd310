//! Camera preview processing core.
//!
//! Converts planar YUV 4:2:0 camera frames into packed RGBA buffers, runs
//! them through a grayscale + edge-detection pass, and feeds the result to a
//! display sink from a single background worker.

pub mod convert;
pub mod diagnostics;
pub mod frame;
pub mod pipeline;
pub mod process;
pub mod runtime;
pub mod settings;

pub use convert::convert;
pub use frame::buffer::{release, PackedBuffer};
pub use frame::error::FrameError;
pub use frame::outcome::Outcome;
pub use frame::types::{FrameGeometry, PixelFormat};
pub use process::{FrameProcessor, ProcessStats};
pub use settings::types::{PipelineSettings, ProcessMode};
