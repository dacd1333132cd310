use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use image::{GrayImage, ImageBuffer, Rgba};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::frame::buffer::PackedBuffer;
use crate::frame::error::{FrameError, Result};
use crate::frame::outcome::Outcome;
use crate::frame::types::PixelFormat;
use crate::settings::types::{PipelineSettings, ProcessMode};

/// Timing for one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    pub elapsed_ms: f64,
    /// Instantaneous rate implied by this frame alone.
    pub fps: f64,
}

impl ProcessStats {
    fn from_elapsed(elapsed: Duration) -> Self {
        Self {
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            fps: fps_from_elapsed(elapsed),
        }
    }
}

/// Frames per second implied by a single frame's processing time.
///
/// Returns 0 when no time was measured instead of dividing by zero.
pub fn fps_from_elapsed(elapsed: Duration) -> f64 {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    if elapsed_ms <= 0.0 {
        return 0.0;
    }
    1000.0 / elapsed_ms
}

/// Applies the configured visual transform to packed RGBA frames in place.
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    settings: PipelineSettings,
}

impl FrameProcessor {
    pub fn new(settings: PipelineSettings) -> Result<Self> {
        settings.validate().map_err(FrameError::InvalidSettings)?;
        crate::runtime::init();
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn mode(&self) -> ProcessMode {
        self.settings.mode
    }

    /// Transform `buffer` in place.
    ///
    /// In edge mode the frame is converted to grayscale, run through Canny
    /// with the configured hysteresis thresholds, and written back as
    /// R=G=B=edge, A=255. The buffer is only overwritten once every step has
    /// succeeded. A missing, empty or non-RGBA buffer, or a panic inside the
    /// image library, yields a failed outcome; nothing unwinds past this call.
    pub fn process(&self, buffer: Option<&mut PackedBuffer>) -> Outcome<ProcessStats> {
        let start = Instant::now();
        let result = match buffer {
            Some(buffer) => self.process_buffer(buffer),
            None => Err(FrameError::MissingBuffer),
        };
        let elapsed = start.elapsed();
        let outcome = Outcome::new(result.map(|()| ProcessStats::from_elapsed(elapsed)), elapsed);

        match (outcome.value(), outcome.error()) {
            (Some(stats), _) => debug!(
                target: "edge_preview::process",
                "{} pass took {:.3}ms ({:.1} fps)",
                self.settings.mode,
                stats.elapsed_ms,
                stats.fps
            ),
            (None, Some(e)) if e.is_invalid_input() => warn!(
                target: "edge_preview::process",
                "rejected frame after {:.3}ms: {e}",
                outcome.elapsed_ms()
            ),
            (None, Some(e)) => error!(
                target: "edge_preview::process",
                "{} pass failed after {:.3}ms: {e}",
                self.settings.mode,
                outcome.elapsed_ms()
            ),
            (None, None) => {}
        }
        outcome
    }

    fn process_buffer(&self, buffer: &mut PackedBuffer) -> Result<()> {
        if buffer.is_empty() {
            return Err(FrameError::EmptyBuffer);
        }
        if buffer.format() != PixelFormat::Rgba8 {
            return Err(FrameError::UnsupportedFormat(buffer.format()));
        }

        let (width, height) = (buffer.width(), buffer.height());
        let transformed = catch_panic(|| self.transform(buffer.as_bytes(), width, height))??;

        if let Some(intensity) = transformed {
            for (pixel, &value) in buffer
                .as_bytes_mut()
                .chunks_exact_mut(4)
                .zip(intensity.as_raw())
            {
                pixel.copy_from_slice(&[value, value, value, 255]);
            }
        }
        Ok(())
    }

    /// Produce the single-channel result, or `None` when the frame is left as is.
    fn transform(&self, rgba: &[u8], width: u32, height: u32) -> Result<Option<GrayImage>> {
        if self.settings.mode == ProcessMode::Passthrough {
            return Ok(None);
        }

        let view = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(width, height, rgba).ok_or_else(|| {
            FrameError::Processing("buffer length does not match its dimensions".to_string())
        })?;
        let gray = image::imageops::grayscale(&view);

        let result = match self.settings.mode {
            ProcessMode::Edges => canny(
                &gray,
                self.settings.low_threshold,
                self.settings.high_threshold,
            ),
            ProcessMode::Blur => gaussian_blur_f32(&gray, self.settings.blur_sigma),
            ProcessMode::Passthrough => return Ok(None),
        };
        Ok(Some(result))
    }
}

/// Run `f`, turning a panic into [`FrameError::Processing`].
///
/// The process-wide panic hook still runs first, so the default hook prints
/// the panic to stderr before it is caught here.
pub(crate) fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| FrameError::Processing(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
