use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::config::OverlayRect;
use crate::models::error::CaptureError;
use crate::models::state::TickOutcome;
use crate::processing::overlay::OverlayHandle;
use crate::processing::raster::SharedSurface;
use crate::processing::streams::LiveVideoSource;

/// Draws the live camera frame plus the optional overlay onto the raster surface,
/// once per display refresh, until cancelled.
///
/// ```text
/// [LiveVideoSource] ──┐
///                      ├→ clear → draw frame (full surface) → draw overlay (fixed rect) → present
/// [OverlayHandle] ────┘
/// ```
pub struct FrameCompositor {
    surface: SharedSurface,
    video: LiveVideoSource,
    overlay: OverlayHandle,
    overlay_rect: OverlayRect,
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameCompositor {
    pub fn new(
        surface: SharedSurface,
        video: LiveVideoSource,
        overlay: OverlayHandle,
        overlay_rect: OverlayRect,
        interval: Duration,
    ) -> Self {
        Self {
            surface,
            video,
            overlay,
            overlay_rect,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Composite one frame.
    ///
    /// Skipped, not failed, when the video source has no frame or has ended.
    pub fn tick(&self) -> TickOutcome {
        Self::tick_inner(&self.surface, &self.video, &self.overlay, self.overlay_rect)
    }

    /// Start the self-rescheduling tick loop. A no-op if already running.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let surface = Arc::clone(&self.surface);
        let video = self.video.clone();
        let overlay = self.overlay.clone();
        let rect = self.overlay_rect;
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("frame-compositor".into())
            .spawn(move || {
                let mut skipping = false;
                while running.load(Ordering::SeqCst) {
                    let tick_start = Instant::now();

                    let outcome = Self::tick_inner(&surface, &video, &overlay, rect);
                    let skipped = outcome == TickOutcome::Skipped;
                    if skipped != skipping {
                        if skipped {
                            log::debug!("Compositor skipping ticks: video source unavailable");
                        } else {
                            log::debug!("Compositor resumed drawing");
                        }
                        skipping = skipped;
                    }

                    if let Some(rest) = interval.checked_sub(tick_start.elapsed()) {
                        thread::sleep(rest);
                    }
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::Unknown(format!("failed to spawn compositor thread: {}", e))
            })?;

        self.handle = Some(handle);
        log::debug!("Compositor started at {:?} per tick", self.interval);
        Ok(())
    }

    /// Stop the tick loop. Idempotent.
    pub fn cancel(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::debug!("Compositor cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    fn tick_inner(
        surface: &SharedSurface,
        video: &LiveVideoSource,
        overlay: &OverlayHandle,
        rect: OverlayRect,
    ) -> TickOutcome {
        let Some(frame) = video.latest_frame() else {
            return TickOutcome::Skipped;
        };
        let image = overlay.current();

        let mut surface = surface.lock();
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return TickOutcome::Skipped;
        }

        surface.clear();
        surface.draw_frame(&frame, 0, 0, width, height);
        if let Some(ref image) = image {
            surface.draw_image(image, rect.x, rect.y, rect.width, rect.height);
        }
        let frame_index = surface.present();

        TickOutcome::Drawn {
            frame_index,
            overlay_drawn: image.is_some(),
        }
    }
}

impl Drop for FrameCompositor {
    fn drop(&mut self) {
        self.cancel();
    }
}
