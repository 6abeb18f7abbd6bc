use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::artifact::{ArtifactMetadata, RecordedArtifact};
use crate::models::config::CaptureConfiguration;
use crate::models::controls::ControlState;
use crate::models::error::CaptureError;
use crate::models::media::{AudioLevels, VideoFrame};
use crate::models::state::RecorderState;
use crate::processing::gain::GainController;
use crate::processing::overlay::OverlayHandle;
use crate::session::capture::CaptureSession;
use crate::session::playback::{PlaybackController, PlaybackSurface};
use crate::session::recording::RecordingEngine;
use crate::traits::device_provider::DeviceProvider;
use crate::traits::media_encoder::EncoderFactory;
use crate::traits::playback_renderer::PlaybackRenderer;
use crate::traits::session_delegate::SessionDelegate;

/// Control state plus the host's delegate, shared with the recorder's consumer thread.
struct ControlsHub {
    controls: Mutex<ControlState>,
    delegate: Mutex<Option<Arc<dyn SessionDelegate>>>,
}

impl ControlsHub {
    fn update(&self, f: impl FnOnce(&mut ControlState)) {
        let controls = {
            let mut c = self.controls.lock();
            let before = *c;
            f(&mut c);
            if *c == before {
                return;
            }
            *c
        };
        if let Some(delegate) = self.delegate() {
            delegate.on_controls_changed(&controls);
        }
    }

    fn delegate(&self) -> Option<Arc<dyn SessionDelegate>> {
        self.delegate.lock().clone()
    }
}

impl SessionDelegate for ControlsHub {
    fn on_controls_changed(&self, controls: &ControlState) {
        if let Some(delegate) = self.delegate() {
            delegate.on_controls_changed(controls);
        }
    }

    fn on_recorder_state_changed(&self, state: &RecorderState) {
        if let Some(delegate) = self.delegate() {
            delegate.on_recorder_state_changed(state);
        }
    }

    fn on_artifact_finalized(&self, metadata: &ArtifactMetadata) {
        // A finished take can be played, however the recording ended.
        self.update(|c| c.play = true);
        if let Some(delegate) = self.delegate() {
            delegate.on_artifact_finalized(metadata);
        }
    }

    fn on_error(&self, error: &CaptureError) {
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }
}

/// Binds the start / stop-recording / stop-video / play / gain / overlay
/// affordances to the capture, recording and playback components.
///
/// Generic over the platform via the `DeviceProvider`, `EncoderFactory` and
/// `PlaybackRenderer` traits.
pub struct LifecycleCoordinator<P: DeviceProvider, E: EncoderFactory, R: PlaybackRenderer> {
    config: CaptureConfiguration,
    capture: CaptureSession<P>,
    encoders: E,
    recorder: RecordingEngine,
    playback: PlaybackController<R>,
    gain: Arc<GainController>,
    overlay: OverlayHandle,
    hub: Arc<ControlsHub>,
}

impl<P: DeviceProvider, E: EncoderFactory, R: PlaybackRenderer> LifecycleCoordinator<P, E, R> {
    pub fn new(config: CaptureConfiguration, provider: P, encoders: E, renderer: R) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let gain = Arc::new(GainController::new(config.initial_gain, config.gain_min, config.gain_max));
        let overlay = OverlayHandle::new();
        let hub = Arc::new(ControlsHub {
            controls: Mutex::new(ControlState::initial()),
            delegate: Mutex::new(None),
        });

        let capture = CaptureSession::new(provider, config.clone(), Arc::clone(&gain), overlay.clone());
        let mut recorder = RecordingEngine::new(config.timeslice(), config.chunk_queue_capacity, config.artifact_retention);
        recorder.set_delegate(hub.clone());
        let playback = PlaybackController::new(renderer, config.playback_policy, config.max_playback_surfaces);

        Ok(Self {
            config,
            capture,
            encoders,
            recorder,
            playback,
            gain,
            overlay,
            hub,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        *self.hub.delegate.lock() = Some(delegate);
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    /// Start request: acquire devices, start recording, begin compositing.
    ///
    /// Failures are logged, reported to the delegate and returned; the
    /// coordinator is then back in its pre-start state.
    pub fn start_requested(&mut self) -> Result<(), CaptureError> {
        // After stop-video the take stays open until its encoder closes it or
        // stop-recording is pressed; start is disabled until then.
        if !self.controls().start {
            log::warn!("Start requested while a take is still in progress");
            return Err(CaptureError::AlreadyStarted);
        }

        let stream = match self.capture.start() {
            Ok(stream) => stream,
            Err(CaptureError::AlreadyStarted) => {
                log::warn!("Start requested while a capture session is active");
                return Err(CaptureError::AlreadyStarted);
            }
            Err(e) => {
                log::error!("Error accessing media devices: {}", e);
                return Err(self.report(e));
            }
        };

        let started = self
            .encoders
            .create(&stream)
            .and_then(|encoder| self.recorder.start(encoder))
            .and_then(|_| self.capture.start_compositing());

        if let Err(e) = started {
            log::error!("Recorder not initialized: {}", e);
            let _ = self.recorder.stop();
            self.capture.stop();
            return Err(self.report(e));
        }

        self.hub.update(|c| *c = ControlState::recording());
        Ok(())
    }

    /// Stop-recording request: finalize the take and release the devices.
    pub fn stop_requested(&mut self) -> Result<Option<ArtifactMetadata>, CaptureError> {
        let result = self.recorder.stop();
        self.capture.stop();

        let has_artifact = self.recorder.artifact_count() > 0;
        self.hub.update(|c| *c = ControlState::stopped(has_artifact));

        result.map_err(|e| self.report(e))
    }

    /// Stop-video request: release the devices only.
    ///
    /// The recorder is not stopped explicitly; its input ends with the devices
    /// and the encoder closes the take on its own.
    pub fn stop_video_requested(&mut self) {
        self.capture.stop();
        self.hub.update(|c| c.stop_video = false);
    }

    /// Gain control moved.
    pub fn set_gain(&self, value: f32) {
        self.gain.set_gain(value);
    }

    /// An overlay image was selected. Decoding happens in the background.
    pub fn upload_overlay(&self, bytes: Vec<u8>) -> Result<thread::JoinHandle<()>, CaptureError> {
        self.overlay.load(bytes)
    }

    pub fn clear_overlay(&self) {
        self.overlay.clear();
    }

    /// Play request: attach a playback surface for the recorded artifacts.
    pub fn play_requested(&mut self) -> Result<Option<PlaybackSurface>, CaptureError> {
        let artifacts = self.recorder.artifacts();
        self.playback.play(&artifacts).map_err(|e| {
            log::error!("Playback failed: {}", e);
            self.report(e)
        })
    }

    /// Block until a take whose input was released has been finalized.
    pub fn wait_for_recorder(&mut self) {
        self.recorder.wait_closed();
    }

    pub fn controls(&self) -> ControlState {
        *self.hub.controls.lock()
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn artifacts(&self) -> Vec<RecordedArtifact> {
        self.recorder.artifacts()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_active()
    }

    pub fn is_compositing(&self) -> bool {
        self.capture.is_compositing()
    }

    pub fn current_levels(&self) -> AudioLevels {
        self.capture.levels()
    }

    pub fn preview_frame(&self) -> Option<VideoFrame> {
        self.capture.preview_frame()
    }

    /// Current contents of the composited surface.
    pub fn composited_frame(&self) -> Option<VideoFrame> {
        self.capture
            .context()
            .map(|c| c.combined_stream().video().snapshot())
    }

    pub fn gain(&self) -> &GainController {
        &self.gain
    }

    pub fn overlay(&self) -> &OverlayHandle {
        &self.overlay
    }

    pub fn capture(&self) -> &CaptureSession<P> {
        &self.capture
    }

    pub fn playback(&self) -> &PlaybackController<R> {
        &self.playback
    }

    fn report(&self, error: CaptureError) -> CaptureError {
        self.hub.on_error(&error);
        error
    }
}

impl<P: DeviceProvider, E: EncoderFactory, R: PlaybackRenderer> Drop for LifecycleCoordinator<P, E, R> {
    fn drop(&mut self) {
        let _ = self.recorder.stop();
        self.capture.stop();
        self.playback.release_all();
    }
}
