use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use edge_preview_lib::pipeline::{CapturedFrame, DisplaySink, ErrorCallback, FrameWorker};
use edge_preview_lib::settings::store::SettingsStore;
use edge_preview_lib::{runtime, FrameError, FrameGeometry, FrameProcessor};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
// Padded rows, as camera HALs commonly deliver them
const Y_ROW_STRIDE: usize = 336;
const UV_ROW_STRIDE: usize = 176;
const SQUARE: usize = 64;
const FRAME_COUNT: u64 = 90;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Synthetic I420 frame: a bright square sliding across a dark background.
fn synthetic_frame(index: u64) -> Result<CapturedFrame, FrameError> {
    let geometry = FrameGeometry::new(WIDTH, HEIGHT, Y_ROW_STRIDE, UV_ROW_STRIDE)?;
    let mut y = vec![40u8; geometry.required_y_len()];

    let offset = (index as usize * 4) % (WIDTH as usize - SQUARE);
    let top = (HEIGHT as usize - SQUARE) / 2;
    for row in top..top + SQUARE {
        let start = row * Y_ROW_STRIDE + offset;
        y[start..start + SQUARE].fill(220);
    }

    let chroma = vec![128u8; geometry.required_uv_len()];
    Ok(CapturedFrame::new(
        y,
        chroma.clone(),
        chroma,
        geometry,
        index * 33_333,
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    info!("{}", runtime::init());

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("edge-preview.json"));
    let settings = SettingsStore::new(settings_path).load()?;
    info!(
        "mode={} thresholds={}/{}",
        settings.mode, settings.low_threshold, settings.high_threshold
    );

    let edge_pixels = Arc::new(AtomicUsize::new(0));
    let sink: DisplaySink = {
        let edge_pixels = Arc::clone(&edge_pixels);
        Arc::new(move |buffer| {
            let lit = buffer.as_bytes().chunks_exact(4).filter(|p| p[0] > 0).count();
            edge_pixels.fetch_add(lit, Ordering::Relaxed);
            debug!("displayed {}x{} frame, {lit} lit pixels", buffer.width(), buffer.height());
        })
    };
    let on_error: ErrorCallback = Arc::new(|msg| error!("frame failed: {msg}"));

    let mut worker = FrameWorker::start(FrameProcessor::new(settings)?, sink, Some(on_error))?;
    for index in 0..FRAME_COUNT {
        worker.submit(synthetic_frame(index)?);
        std::thread::sleep(FRAME_INTERVAL);
    }
    worker.stop();

    let snapshot = worker.diagnostics();
    info!(
        "processed {} frames, dropped {}, {} lit pixels total",
        snapshot.frame_count,
        snapshot.drop_count,
        edge_pixels.load(Ordering::Relaxed)
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
