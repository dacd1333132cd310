use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use super::slot::{CapturedFrame, LatestFrameSlot, PushResult};
use crate::diagnostics::stats::{DiagnosticSnapshot, DiagnosticStats};
use crate::frame::buffer::PackedBuffer;
use crate::frame::error::FrameError;
use crate::process::processor::catch_panic;
use crate::process::FrameProcessor;

/// Receives every successfully produced frame, on the worker thread.
pub type DisplaySink = Arc<dyn Fn(&PackedBuffer) + Send + Sync>;

/// Callback type for reporting frame failures to a status display.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Frame worker errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to spawn frame worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Dedicated background thread that converts and processes frames one at
/// a time.
///
/// Frames are submitted from the capture callback into a
/// [`LatestFrameSlot`]; when the worker falls behind, older waiting frames
/// are dropped. Each produced buffer is owned by the worker thread from
/// conversion until it is released after display.
pub struct FrameWorker {
    slot: Arc<LatestFrameSlot>,
    stats: Arc<Mutex<DiagnosticStats>>,
    thread: Option<JoinHandle<()>>,
}

impl FrameWorker {
    /// Spawn the worker thread.
    ///
    /// If `on_error` is provided, it is called with a message for every
    /// frame that fails to convert or process.
    pub fn start(
        processor: FrameProcessor,
        sink: DisplaySink,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self, PipelineError> {
        let slot = Arc::new(LatestFrameSlot::new());
        let stats = Arc::new(Mutex::new(DiagnosticStats::new()));

        let thread = {
            let slot = Arc::clone(&slot);
            let stats = Arc::clone(&stats);
            std::thread::Builder::new()
                .name("frame-worker".to_string())
                .spawn(move || {
                    let _closer = CloseOnExit(&slot);
                    info!("frame worker starting ({} mode)", processor.mode());
                    Self::run(&slot, &stats, &processor, &sink, on_error.as_ref());
                    info!("frame worker exiting");
                })?
        };

        Ok(Self {
            slot,
            stats,
            thread: Some(thread),
        })
    }

    /// Queue a frame for processing. Called from the capture callback.
    pub fn submit(&self, frame: CapturedFrame) -> PushResult {
        let result = self.slot.push(frame);
        if result == PushResult::Replaced {
            self.stats.lock().record_drop();
        }
        result
    }

    /// Check if the worker is accepting frames.
    pub fn is_running(&self) -> bool {
        self.thread.is_some() && !self.slot.is_closed()
    }

    /// Take a snapshot of diagnostic stats for this session.
    pub fn diagnostics(&self) -> DiagnosticSnapshot {
        self.stats.lock().snapshot()
    }

    /// Stop the worker. Idempotent; calling stop twice does not panic.
    ///
    /// A frame already in flight runs to completion; a waiting frame is
    /// discarded.
    pub fn stop(&mut self) {
        self.slot.close();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("frame worker panicked");
            }
        }
    }

    fn run(
        slot: &LatestFrameSlot,
        stats: &Mutex<DiagnosticStats>,
        processor: &FrameProcessor,
        sink: &DisplaySink,
        on_error: Option<&ErrorCallback>,
    ) {
        while let Some(frame) = slot.take_blocking() {
            let start = Instant::now();
            match Self::handle_frame(&frame, processor, sink) {
                Ok(bytes) => stats.lock().record_frame(bytes, start.elapsed()),
                Err(e) => {
                    stats.lock().record_failure();
                    if let Some(cb) = on_error {
                        cb(&e.to_string());
                    }
                }
            }
        }
    }

    /// Convert, process, display and release one frame.
    ///
    /// Returns the number of bytes handed to the sink. On failure the
    /// sink is not called and any buffer produced so far is freed. A
    /// panicking sink counts as a failed frame.
    fn handle_frame(
        frame: &CapturedFrame,
        processor: &FrameProcessor,
        sink: &DisplaySink,
    ) -> Result<usize, FrameError> {
        let mut buffer = frame.convert().into_result()?;
        processor.process(Some(&mut buffer)).into_result()?;

        catch_panic(|| sink(&buffer)).map_err(|e| match e {
            FrameError::Processing(msg) => {
                FrameError::Processing(format!("display sink panicked: {msg}"))
            }
            other => other,
        })?;
        let bytes = buffer.len();
        buffer.release();
        Ok(bytes)
    }
}

/// Closes the slot when the worker thread ends, even by unwinding, so
/// `submit` reports `Closed` instead of queueing into a dead worker.
struct CloseOnExit<'a>(&'a LatestFrameSlot);

impl Drop for CloseOnExit<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl Drop for FrameWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
