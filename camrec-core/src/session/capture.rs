use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::{AudioLevels, MediaKind, VideoFrame};
use crate::processing::audio_graph::{AudioContext, AudioGraph};
use crate::processing::gain::GainController;
use crate::processing::overlay::OverlayHandle;
use crate::processing::raster::RasterSurface;
use crate::processing::streams::{CombinedStream, LiveVideoSource, RasterStream};
use crate::session::compositor::FrameCompositor;
use crate::traits::device_provider::{DeviceProvider, DeviceStream, StreamSink};

/// Every resource acquired for one capture session.
///
/// Created by [`CaptureSession::start`] and dropped by [`CaptureSession::stop`].
pub struct SessionContext {
    id: String,
    device: Box<dyn DeviceStream>,
    graph: AudioGraph,
    video: LiveVideoSource,
    combined: CombinedStream,
    compositor: FrameCompositor,
    live: Arc<AtomicBool>,
    started_at: Instant,
}

impl SessionContext {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn combined_stream(&self) -> &CombinedStream {
        &self.combined
    }

    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    fn release(&mut self) {
        self.device.stop_all_tracks();
        self.video.end();
        self.live.store(false, Ordering::SeqCst);
        self.compositor.cancel();
    }
}

/// Acquires the camera/microphone and wires them into a recordable combined stream.
///
/// ```text
/// [Device video] → [LiveVideoSource] → [FrameCompositor] → [RasterSurface] → [RasterStream] ─┐
///                                                                                             ├→ [CombinedStream]
/// [Device audio] → [AudioGraph: source → gain → destination] ────────────────────────────────┘
/// ```
pub struct CaptureSession<P: DeviceProvider> {
    provider: P,
    config: CaptureConfiguration,
    gain: Arc<GainController>,
    overlay: OverlayHandle,
    audio_context: Option<Arc<AudioContext>>,
    context: Option<SessionContext>,
}

impl<P: DeviceProvider> CaptureSession<P> {
    pub fn new(
        provider: P,
        config: CaptureConfiguration,
        gain: Arc<GainController>,
        overlay: OverlayHandle,
    ) -> Self {
        Self {
            provider,
            config,
            gain,
            overlay,
            audio_context: None,
            context: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Acquire devices and build the combined stream.
    ///
    /// Fails with [`CaptureError::AlreadyStarted`] while a session is active,
    /// without touching the hardware again.
    pub fn start(&mut self) -> Result<CombinedStream, CaptureError> {
        if self.context.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }

        let mut device = self.provider.acquire(&self.config.request)?;

        let audio_context = Arc::clone(
            self.audio_context
                .get_or_insert_with(|| AudioContext::new(self.config.audio_sample_rate)),
        );
        let audio_track = device.tracks().into_iter().find(|t| t.kind == MediaKind::Audio);
        if audio_track.is_none() {
            log::warn!("Capture device delivered no audio track; recording silence");
        }
        let graph = AudioGraph::connect(&audio_context, audio_track);

        let video = LiveVideoSource::new();
        let preview = video.clone();
        let sink = StreamSink {
            on_video: Arc::new(move |frame: VideoFrame| preview.push(frame)),
            on_audio: graph.source_callback(),
        };
        if let Err(e) = device.start(sink) {
            device.stop_all_tracks();
            return Err(e);
        }

        let surface = RasterSurface::shared(self.config.surface_width, self.config.surface_height);
        let live = Arc::new(AtomicBool::new(true));
        let combined = CombinedStream::new(
            RasterStream::capture(Arc::clone(&surface)),
            graph.destination().clone(),
            Arc::clone(&live),
        );
        let compositor = FrameCompositor::new(
            surface,
            video.clone(),
            self.overlay.clone(),
            self.config.overlay_rect,
            self.config.tick_interval(),
        );

        self.gain.attach(graph.gain().clone());

        let context = SessionContext {
            id: uuid::Uuid::new_v4().to_string(),
            device,
            graph,
            video,
            combined: combined.clone(),
            compositor,
            live,
            started_at: Instant::now(),
        };
        log::info!(
            "Capture session {} started ({} tracks)",
            context.id,
            combined.tracks().len()
        );
        self.context = Some(context);
        Ok(combined)
    }

    /// Begin the compositor's tick loop for the active session.
    pub fn start_compositing(&mut self) -> Result<(), CaptureError> {
        match self.context.as_mut() {
            Some(context) => context.compositor.start(),
            None => Err(CaptureError::ConfigurationFailed("no active capture session".into())),
        }
    }

    /// Release every device track and cancel compositing. A no-op without a session.
    pub fn stop(&mut self) {
        let Some(mut context) = self.context.take() else {
            log::debug!("Capture stop requested with no active session");
            return;
        };
        context.release();
        self.gain.detach();
        log::info!(
            "Capture session {} stopped after {:.2}s",
            context.id,
            context.elapsed_secs()
        );
    }

    /// Latest camera frame, for a live preview.
    pub fn preview_frame(&self) -> Option<VideoFrame> {
        self.context.as_ref().and_then(|c| c.video.latest_frame())
    }

    pub fn levels(&self) -> AudioLevels {
        self.context
            .as_ref()
            .map(|c| c.graph.destination().levels())
            .unwrap_or_default()
    }

    pub fn is_compositing(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.compositor.is_running())
    }
}

impl<P: DeviceProvider> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.release();
        }
    }
}
