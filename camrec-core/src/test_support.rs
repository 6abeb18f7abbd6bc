//! Deterministic platform doubles for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::artifact::ArtifactMetadata;
use crate::models::controls::ControlState;
use crate::models::error::CaptureError;
use crate::models::media::{MediaKind, StreamRequest, TrackInfo, VideoFrame};
use crate::models::state::RecorderState;
use crate::processing::streams::CombinedStream;
use crate::session::playback::PlaybackSurface;
use crate::traits::device_provider::{DeviceProvider, DeviceStream, StreamSink};
use crate::traits::media_encoder::{ChunkSender, EncoderEvent, EncoderFactory, MediaEncoder};
use crate::traits::playback_renderer::PlaybackRenderer;
use crate::traits::session_delegate::SessionDelegate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Grant,
    Deny,
    NoDevice,
}

#[derive(Default)]
struct DeviceState {
    sink: Option<StreamSink>,
    stopped: bool,
}

/// Test-side view of a device handed out by [`FakeProvider`].
#[derive(Clone, Default)]
pub struct FakeDeviceHandle {
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDeviceHandle {
    pub fn push_frame(&self, frame: VideoFrame) {
        let sink = self.state.lock().sink.clone();
        if let Some(sink) = sink {
            (sink.on_video)(frame);
        }
    }

    pub fn push_audio(&self, samples: &[f32], sample_rate: f64, channels: u16) {
        let sink = self.state.lock().sink.clone();
        if let Some(sink) = sink {
            (sink.on_audio)(samples, sample_rate, channels);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }
}

struct FakeDeviceStream {
    handle: FakeDeviceHandle,
    tracks: Vec<TrackInfo>,
}

impl DeviceStream for FakeDeviceStream {
    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.clone()
    }

    fn start(&mut self, sink: StreamSink) -> Result<(), CaptureError> {
        self.handle.state.lock().sink = Some(sink);
        Ok(())
    }

    fn stop_all_tracks(&mut self) {
        let mut state = self.handle.state.lock();
        state.stopped = true;
        state.sink = None;
    }

    fn is_live(&self) -> bool {
        !self.handle.state.lock().stopped
    }
}

pub struct FakeProvider {
    outcome: AccessOutcome,
    acquisitions: AtomicUsize,
    last: Mutex<Option<FakeDeviceHandle>>,
}

impl FakeProvider {
    pub fn new(outcome: AccessOutcome) -> Self {
        Self {
            outcome,
            acquisitions: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn last_device(&self) -> Option<FakeDeviceHandle> {
        self.last.lock().clone()
    }
}

impl DeviceProvider for FakeProvider {
    fn is_available(&self) -> bool {
        self.outcome != AccessOutcome::NoDevice
    }

    fn acquire(&self, _request: &StreamRequest) -> Result<Box<dyn DeviceStream>, CaptureError> {
        match self.outcome {
            AccessOutcome::Deny => return Err(CaptureError::PermissionDenied),
            AccessOutcome::NoDevice => return Err(CaptureError::DeviceNotAvailable),
            AccessOutcome::Grant => {}
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let handle = FakeDeviceHandle::default();
        *self.last.lock() = Some(handle.clone());
        Ok(Box::new(FakeDeviceStream {
            handle,
            tracks: vec![
                TrackInfo::new(MediaKind::Video, "fake camera"),
                TrackInfo::new(MediaKind::Audio, "fake microphone"),
            ],
        }))
    }
}

/// Closes a [`FakeEncoder`] from outside, as a dying input stream would.
#[derive(Clone)]
pub struct EncoderCloser {
    sender: Arc<Mutex<Option<ChunkSender>>>,
}

impl EncoderCloser {
    pub fn close(&self) {
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(EncoderEvent::Closed);
        }
    }
}

/// Emits its scripted chunks on start and a final `[0xff]` chunk on stop.
pub struct FakeEncoder {
    chunks: Vec<Vec<u8>>,
    fail: bool,
    sender: Arc<Mutex<Option<ChunkSender>>>,
}

impl FakeEncoder {
    pub fn with_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            fail: false,
            sender: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_chunks(Vec::new())
        }
    }

    pub fn closer(&self) -> EncoderCloser {
        EncoderCloser {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl MediaEncoder for FakeEncoder {
    fn mime_type(&self) -> &str {
        "video/x-test"
    }

    fn start(&mut self, _timeslice: Duration, sink: ChunkSender) -> Result<(), CaptureError> {
        if self.fail {
            return Err(CaptureError::RecorderUnavailable("fake encoder refused".into()));
        }
        for chunk in self.chunks.drain(..) {
            let _ = sink.send(EncoderEvent::Data(chunk));
        }
        *self.sender.lock() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(EncoderEvent::Data(vec![0xff]));
            let _ = tx.send(EncoderEvent::Closed);
        }
        Ok(())
    }
}

pub struct FakeEncoderFactory {
    fail: AtomicBool,
    created: AtomicUsize,
}

impl FakeEncoderFactory {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            created: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let factory = Self::new();
        factory.fail.store(true, Ordering::SeqCst);
        factory
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EncoderFactory for FakeEncoderFactory {
    fn create(&self, stream: &CombinedStream) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CaptureError::RecorderUnavailable("no encoder for stream".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let marker = stream.tracks().len() as u8;
        Ok(Box::new(FakeEncoder::with_chunks(vec![vec![marker]])))
    }
}

/// Clones share their record of attached and released surfaces.
#[derive(Clone, Default)]
pub struct FakeRenderer {
    fail: bool,
    attached: Arc<Mutex<Vec<String>>>,
    released: Arc<Mutex<Vec<String>>>,
}

impl FakeRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn attached(&self) -> Vec<String> {
        self.attached.lock().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

impl PlaybackRenderer for FakeRenderer {
    fn attach(&self, surface: &PlaybackSurface) -> Result<(), CaptureError> {
        if self.fail {
            return Err(CaptureError::PlaybackFailed("renderer offline".into()));
        }
        self.attached.lock().push(surface.id.clone());
        Ok(())
    }

    fn release(&self, surface_id: &str) {
        self.released.lock().push(surface_id.to_string());
    }
}

/// Collects every delegate callback.
#[derive(Default)]
pub struct RecordingDelegate {
    controls: Mutex<Vec<ControlState>>,
    states: Mutex<Vec<RecorderState>>,
    artifacts: Mutex<Vec<ArtifactMetadata>>,
    errors: Mutex<Vec<CaptureError>>,
}

impl RecordingDelegate {
    pub fn controls(&self) -> Vec<ControlState> {
        self.controls.lock().clone()
    }

    pub fn recorder_states(&self) -> Vec<RecorderState> {
        self.states.lock().clone()
    }

    pub fn artifacts(&self) -> Vec<ArtifactMetadata> {
        self.artifacts.lock().clone()
    }

    pub fn errors(&self) -> Vec<CaptureError> {
        self.errors.lock().clone()
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_controls_changed(&self, controls: &ControlState) {
        self.controls.lock().push(*controls);
    }

    fn on_recorder_state_changed(&self, state: &RecorderState) {
        self.states.lock().push(*state);
    }

    fn on_artifact_finalized(&self, metadata: &ArtifactMetadata) {
        self.artifacts.lock().push(metadata.clone());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }
}
