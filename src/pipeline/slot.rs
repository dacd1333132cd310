use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::convert;
use crate::frame::buffer::PackedBuffer;
use crate::frame::outcome::Outcome;
use crate::frame::types::FrameGeometry;

/// A captured planar YUV 4:2:0 frame, copied out of capture-source memory.
///
/// Capture sources only guarantee their planes for the duration of the
/// frame callback, so frames are copied before being queued for the worker.
pub struct CapturedFrame {
    y: Vec<u8>,
    u: Vec<u8>,
    v: Vec<u8>,
    geometry: FrameGeometry,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

impl CapturedFrame {
    pub fn new(
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
        geometry: FrameGeometry,
        timestamp_us: u64,
    ) -> Self {
        Self {
            y,
            u,
            v,
            geometry,
            timestamp_us,
        }
    }

    /// Copy borrowed planes into an owned frame.
    pub fn copy_from(
        y: &[u8],
        u: &[u8],
        v: &[u8],
        geometry: FrameGeometry,
        timestamp_us: u64,
    ) -> Self {
        Self::new(y.to_vec(), u.to_vec(), v.to_vec(), geometry, timestamp_us)
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Convert this frame into a packed RGBA buffer.
    pub fn convert(&self) -> Outcome<PackedBuffer> {
        convert::convert(&self.y, &self.u, &self.v, &self.geometry)
    }
}

/// What happened to a frame handed to [`LatestFrameSlot::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// The slot was empty; the frame is waiting for the worker.
    Queued,
    /// An unconsumed frame was dropped in favour of this one.
    Replaced,
    /// The slot is closed; the frame was discarded.
    Closed,
}

struct SlotState {
    pending: Option<CapturedFrame>,
    closed: bool,
}

/// Single-frame queue with latest-only backpressure.
///
/// Holds at most one frame. Pushing while a frame is still waiting replaces
/// it, so a slow consumer always picks up the newest frame and memory stays
/// bounded.
pub struct LatestFrameSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
    /// Monotonic counter incremented on each accepted push.
    sequence: AtomicU64,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Offer a frame, replacing any frame still waiting.
    pub fn push(&self, frame: CapturedFrame) -> PushResult {
        let replaced = {
            let mut state = self.state.lock();
            if state.closed {
                return PushResult::Closed;
            }
            state.pending.replace(frame)
        };
        self.sequence.fetch_add(1, Ordering::Relaxed);
        self.ready.notify_one();

        // The displaced frame is dropped here, outside the lock
        match replaced {
            Some(_) => PushResult::Replaced,
            None => PushResult::Queued,
        }
    }

    /// Take the waiting frame without blocking.
    pub fn try_take(&self) -> Option<CapturedFrame> {
        self.state.lock().pending.take()
    }

    /// Block until a frame is available. Returns `None` once the slot closes.
    pub fn take_blocking(&self) -> Option<CapturedFrame> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(frame) = state.pending.take() {
                return Some(frame);
            }
            self.ready.wait(&mut state);
        }
    }

    /// Close the slot, discarding any waiting frame and waking the consumer.
    pub fn close(&self) {
        let discarded = {
            let mut state = self.state.lock();
            state.closed = true;
            state.pending.take()
        };
        self.ready.notify_all();
        drop(discarded);
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Return the monotonic sequence number. Increases by 1 for each
    /// accepted push, whether or not the frame is later dropped.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl Default for LatestFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
