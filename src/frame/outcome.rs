use std::time::Duration;

use crate::frame::error::FrameError;

/// Result of a boundary operation.
///
/// Carries the produced value on success or the error that stopped the
/// operation, plus how long the call took. Boundary functions return this
/// instead of `Result` so callers always get timing, and so that nothing
/// unwinds out of the conversion or processing path.
#[derive(Debug)]
pub struct Outcome<T> {
    result: Result<T, FrameError>,
    elapsed: Duration,
}

impl<T> Outcome<T> {
    pub(crate) fn new(result: Result<T, FrameError>, elapsed: Duration) -> Self {
        Self { result, elapsed }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time in fractional milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&FrameError> {
        self.result.as_ref().err()
    }

    /// Take the value, discarding the diagnostic.
    pub fn into_value(self) -> Option<T> {
        self.result.ok()
    }

    pub fn into_result(self) -> Result<T, FrameError> {
        self.result
    }
}
