// Frame pipeline: latest-only queue and the single worker thread.

pub mod slot;
pub mod worker;

pub use slot::{CapturedFrame, LatestFrameSlot, PushResult};
pub use worker::{DisplaySink, ErrorCallback, FrameWorker, PipelineError};
