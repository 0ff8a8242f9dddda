//! Face-centered video stabilization pipeline.
//!
//! A dedicated OS thread runs the capture → detect → smooth → crop →
//! emit loop once per tick. Similarity requests and mosaic loading run
//! on the tokio side so the capture loop never blocks on the network or
//! on disk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use likeness_client::{MatchOutcome, MatcherClient};
use likeness_core::crop::CropError;
use likeness_core::{
    CropWindowResolver, Detector, DetectorError, FaceSession, MosaicLayout, MotionFilter,
    SessionEvent,
};
use likeness_hw::camera::CameraError;
use likeness_hw::frame::FrameError;
use likeness_hw::{Frame, FrameSource};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::sprites::{self, MosaicEvent};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("crop geometry rejected: {0}")]
    Crop(#[from] CropError),
    #[error("failed to spawn pipeline thread: {0}")]
    ThreadSpawn(std::io::Error),
}

/// A single tick's failure. Logged by the loop; never terminates it.
#[derive(Error, Debug)]
enum TickError {
    #[error("no frame available: {0}")]
    Capture(#[from] CameraError),
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("frame processing: {0}")]
    Frame(#[from] FrameError),
}

/// The per-tick output of the pipeline: a fixed-size RGB square centered
/// on the smoothed face position.
pub struct StabilizedFrame {
    /// Packed RGB pixel data (size * size * 3 bytes).
    pub data: Vec<u8>,
    pub size: u32,
}

/// Receiving ends of the pipeline's two output streams. The display
/// surface consumes both on its own refresh cycle.
pub struct DisplayStreams {
    pub frames: mpsc::Receiver<StabilizedFrame>,
    pub mosaic: mpsc::UnboundedReceiver<MosaicEvent>,
}

pub struct PipelineConfig {
    pub square_size: u32,
    pub tick_interval: Duration,
}

/// Handle to the running pipeline thread.
pub struct PipelineHandle {
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl PipelineHandle {
    /// Stop the capture loop and wait for the thread to exit, releasing
    /// the camera. Idempotent; in-flight mosaic loading is left to run
    /// to completion.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("pipeline thread panicked");
            }
        }
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Mutable per-pipeline tracking state, owned by the tick loop.
struct TickState {
    motion: MotionFilter,
    session: FaceSession,
    /// Full pre-crop frame from the most recent tick with a detection;
    /// substituted when capture fails and frozen on when detection drops.
    last_frame_with_face: Option<Frame>,
}

struct TickOutput {
    emitted: Option<StabilizedFrame>,
    /// Set on a new-face transition: the stabilized crop to upload.
    snapshot: Option<Frame>,
}

/// Spawn the stabilization pipeline on a dedicated OS thread.
///
/// Crop geometry is validated against the source dimensions up front;
/// an oversized square is a configuration error, not a runtime one.
pub fn spawn_pipeline<S, D>(
    mut source: S,
    mut detector: D,
    client: MatcherClient,
    layout: MosaicLayout,
    config: PipelineConfig,
    runtime: tokio::runtime::Handle,
) -> Result<(PipelineHandle, DisplayStreams), PipelineError>
where
    S: FrameSource + Send + 'static,
    D: Detector + Send + 'static,
{
    let (width, height) = source.dimensions();
    let resolver = CropWindowResolver::new(config.square_size, width, height)?;

    // A lagging display drops stabilized frames rather than stalling
    // capture, so the frame channel stays shallow.
    let (frames_tx, frames_rx) = mpsc::channel::<StabilizedFrame>(2);
    let (mosaic_tx, mosaic_rx) = mpsc::unbounded_channel::<MosaicEvent>();

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let client = Arc::new(client);

    let thread = std::thread::Builder::new()
        .name("likeness-pipeline".into())
        .spawn(move || {
            tracing::info!(width, height, square = resolver.square(), "pipeline thread started");
            let mut state = TickState {
                motion: MotionFilter::new(),
                session: FaceSession::new(),
                last_frame_with_face: None,
            };

            while !stop_flag.load(Ordering::Relaxed) {
                let tick_started = Instant::now();

                match run_tick(&mut source, &mut detector, &mut state, &resolver) {
                    Ok(output) => {
                        if let Some(frame) = output.emitted {
                            let _ = frames_tx.try_send(frame);
                        }
                        if let Some(snapshot) = output.snapshot {
                            tracing::info!("new face detected");
                            dispatch_similarity(
                                &runtime,
                                client.clone(),
                                layout,
                                snapshot,
                                mosaic_tx.clone(),
                            );
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "tick abandoned");
                    }
                }

                if let Some(rest) = config.tick_interval.checked_sub(tick_started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
            tracing::info!("pipeline thread exiting");
        })
        .map_err(PipelineError::ThreadSpawn)?;

    Ok((
        PipelineHandle {
            stop,
            thread: Some(thread),
        },
        DisplayStreams {
            frames: frames_rx,
            mosaic: mosaic_rx,
        },
    ))
}

/// One pass of the per-tick state machine.
fn run_tick<S: FrameSource, D: Detector>(
    source: &mut S,
    detector: &mut D,
    state: &mut TickState,
    resolver: &CropWindowResolver,
) -> Result<TickOutput, TickError> {
    // 1. Acquire, substituting the last good frame on a capture fault.
    let frame = match source.next_frame() {
        Ok(frame) if !frame.is_empty() => frame,
        Ok(_) | Err(_) => match &state.last_frame_with_face {
            Some(cached) => {
                tracing::debug!("capture fault, substituting last frame with a face");
                cached.clone()
            }
            None => {
                return Err(TickError::Capture(CameraError::CaptureFailed(
                    "no frame and no cached fallback".to_string(),
                )))
            }
        },
    };

    // 2. Detect; the session is updated on every tick regardless of outcome.
    let bbox = detector.detect(&frame.data, frame.width, frame.height)?;
    let event = state.session.observe(bbox.is_some());

    // 3. No face: the display freezes on the last composition. The motion
    // estimate keeps aging so tracking resumes smoothly.
    let Some(bbox) = bbox else {
        state.motion.predict();
        if event == SessionEvent::Lost {
            tracing::info!("face lost after consecutive misses, session reset");
        }
        return Ok(TickOutput {
            emitted: None,
            snapshot: None,
        });
    };

    // 4. Smooth the detected centroid.
    state.motion.predict();
    let (cx, cy) = state.motion.correct(bbox.centroid());

    // 5. Crop, convert to RGB, defensively resize, emit.
    let rect = resolver.resolve(cx, cy);
    let crop = frame
        .crop(rect.x1, rect.y1, rect.width(), rect.height())?
        .resize(resolver.square(), resolver.square());
    let emitted = StabilizedFrame {
        data: crop.to_rgb(),
        size: resolver.square(),
    };

    // 6. Cache the full pre-crop frame for future fallback.
    state.last_frame_with_face = Some(frame);

    let snapshot = (event == SessionEvent::NewFace).then_some(crop);

    Ok(TickOutput {
        emitted: Some(emitted),
        snapshot,
    })
}

/// Run the similarity request off the tick thread. The session flag is
/// already set by the time this is called, so a second new-face event
/// cannot start while this request is in flight.
fn dispatch_similarity(
    runtime: &tokio::runtime::Handle,
    client: Arc<MatcherClient>,
    layout: MosaicLayout,
    snapshot: Frame,
    mosaic_tx: mpsc::UnboundedSender<MosaicEvent>,
) {
    runtime.spawn(async move {
        match client.submit(&snapshot, layout.cell_count() as u32).await {
            Ok(MatchOutcome::Matches(ranked)) => {
                let handle = tokio::task::spawn_blocking(move || {
                    sprites::load_mosaic(&layout, &ranked, &mosaic_tx);
                });
                if handle.await.is_err() {
                    tracing::error!("mosaic loader panicked");
                }
            }
            Ok(MatchOutcome::NoFace) => {
                tracing::info!("matcher saw no face in snapshot; mosaic unchanged");
            }
            Err(err) => {
                tracing::error!(error = %err, "similarity request failed; mosaic unchanged");
            }
        }
    });
}
