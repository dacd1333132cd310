// Frame processing: in-place visual transforms and per-frame timing.

pub mod processor;

pub use processor::{fps_from_elapsed, FrameProcessor, ProcessStats};
