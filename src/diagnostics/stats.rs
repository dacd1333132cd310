use serde::Serialize;
use std::time::{Duration, Instant};

use crate::process::fps_from_elapsed;

/// Collects diagnostic statistics for a frame pipeline session.
pub struct DiagnosticStats {
    frame_count: u64,
    drop_count: u64,
    failure_count: u64,
    total_bytes: u64,
    start_time: Instant,
    last_frame_time: Option<Instant>,
    last_frame_elapsed: Duration,
}

/// Snapshot of diagnostic stats for serialisation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    pub fps: f64,
    pub instant_fps: f64,
    pub frame_count: u64,
    pub drop_count: u64,
    pub failure_count: u64,
    pub drop_rate: f64,
    pub last_frame_ms: f64,
    /// Milliseconds since the last displayed frame; `None` before the first.
    pub since_last_frame_ms: Option<f64>,
    pub bandwidth_bps: u64,
}

impl DiagnosticStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            drop_count: 0,
            failure_count: 0,
            total_bytes: 0,
            start_time: Instant::now(),
            last_frame_time: None,
            last_frame_elapsed: Duration::ZERO,
        }
    }

    /// Record a frame that was converted, processed and displayed.
    ///
    /// `elapsed` is the time the frame spent in the pipeline worker.
    pub fn record_frame(&mut self, bytes: usize, elapsed: Duration) {
        self.frame_count += 1;
        self.total_bytes += bytes as u64;
        self.last_frame_time = Some(Instant::now());
        self.last_frame_elapsed = elapsed;
    }

    /// Record a frame replaced in the queue before the worker reached it.
    pub fn record_drop(&mut self) {
        self.drop_count += 1;
    }

    /// Record a frame whose conversion or processing failed.
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// Time since the last displayed frame, if any.
    pub fn since_last_frame(&self) -> Option<Duration> {
        self.last_frame_time.map(|t| t.elapsed())
    }

    /// Calculate average FPS since the session started.
    pub fn fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        self.frame_count as f64 / elapsed
    }

    /// Rate implied by the most recent frame's processing time alone.
    pub fn instant_fps(&self) -> f64 {
        fps_from_elapsed(self.last_frame_elapsed)
    }

    /// Drop rate as a percentage (0.0 - 100.0).
    pub fn drop_rate(&self) -> f64 {
        let total = self.frame_count + self.drop_count + self.failure_count;
        if total == 0 {
            return 0.0;
        }
        (self.drop_count as f64 / total as f64) * 100.0
    }

    /// Processing time of the most recent frame in milliseconds.
    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_elapsed.as_secs_f64() * 1000.0
    }

    /// Output bandwidth in bytes per second.
    pub fn bandwidth_bps(&self) -> u64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0;
        }
        (self.total_bytes as f64 / elapsed) as u64
    }

    /// Take a serialisable snapshot.
    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            fps: self.fps(),
            instant_fps: self.instant_fps(),
            frame_count: self.frame_count,
            drop_count: self.drop_count,
            failure_count: self.failure_count,
            drop_rate: self.drop_rate(),
            last_frame_ms: self.last_frame_ms(),
            since_last_frame_ms: self
                .since_last_frame()
                .map(|d| d.as_secs_f64() * 1000.0),
            bandwidth_bps: self.bandwidth_bps(),
        }
    }
}

impl Default for DiagnosticStats {
    fn default() -> Self {
        Self::new()
    }
}
