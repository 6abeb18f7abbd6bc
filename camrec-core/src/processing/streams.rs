//! Stream views wired together by a capture session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::media::{MediaKind, TrackInfo, VideoFrame};
use crate::processing::audio_graph::MediaStreamDestination;
use crate::processing::raster::SharedSurface;

/// Latest camera frame plus a liveness flag, fed by the device stream.
///
/// Doubles as the live preview a host can display.
#[derive(Clone)]
pub struct LiveVideoSource {
    latest: Arc<Mutex<Option<VideoFrame>>>,
    live: Arc<AtomicBool>,
}

impl LiveVideoSource {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(Mutex::new(None)),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn push(&self, frame: VideoFrame) {
        if self.is_live() {
            *self.latest.lock() = Some(frame);
        }
    }

    pub fn latest_frame(&self) -> Option<VideoFrame> {
        if !self.is_live() {
            return None;
        }
        self.latest.lock().clone()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Mark the source as ended and drop the last frame.
    pub fn end(&self) {
        self.live.store(false, Ordering::SeqCst);
        *self.latest.lock() = None;
    }
}

impl Default for LiveVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Live capture of the compositor's raster surface.
#[derive(Clone)]
pub struct RasterStream {
    surface: SharedSurface,
    track: TrackInfo,
}

impl RasterStream {
    pub fn capture(surface: SharedSurface) -> Self {
        Self {
            surface,
            track: TrackInfo::new(MediaKind::Video, "composited surface"),
        }
    }

    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    /// Current surface contents.
    pub fn snapshot(&self) -> VideoFrame {
        self.surface.lock().snapshot()
    }

    /// Index of the most recently presented frame.
    pub fn frame_index(&self) -> u64 {
        self.surface.lock().frame_index()
    }
}

/// Composited video tracks merged with the mixed audio track.
///
/// Built once per capture session; read-only afterwards.
#[derive(Clone)]
pub struct CombinedStream {
    id: String,
    video: RasterStream,
    audio: MediaStreamDestination,
    live: Arc<AtomicBool>,
}

impl CombinedStream {
    pub fn new(video: RasterStream, audio: MediaStreamDestination, live: Arc<AtomicBool>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            video,
            audio,
            live,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn video(&self) -> &RasterStream {
        &self.video
    }

    pub fn audio(&self) -> &MediaStreamDestination {
        &self.audio
    }

    pub fn video_tracks(&self) -> Vec<TrackInfo> {
        vec![self.video.track().clone()]
    }

    pub fn audio_tracks(&self) -> Vec<TrackInfo> {
        vec![self.audio.track().clone()]
    }

    pub fn tracks(&self) -> Vec<TrackInfo> {
        let mut tracks = self.video_tracks();
        tracks.extend(self.audio_tracks());
        tracks
    }

    /// False once the capture session that produced this stream has stopped.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CombinedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks().len())
            .field("live", &self.is_live())
            .finish()
    }
}
