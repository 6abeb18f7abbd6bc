//! # camrec-core
//!
//! Platform-agnostic webcam compositor and recorder core.
//!
//! Captures a camera + microphone stream, composites an optional still
//! overlay onto a fixed-size raster every display refresh, mixes the
//! microphone through a live gain stage, records the composited raster plus
//! mixed audio as chunked container data, and plays the takes back.
//! Platform backends implement the `DeviceProvider`, `EncoderFactory` and
//! `PlaybackRenderer` traits and plug into the generic `LifecycleCoordinator`.
//!
//! ## Architecture
//!
//! ```text
//! camrec-core (this crate)
//! ├── traits/       ← DeviceProvider, DeviceStream, MediaEncoder, EncoderFactory, PlaybackRenderer, SessionDelegate
//! ├── models/       ← CaptureError, RecorderState, CaptureConfiguration, RecordedArtifact, ControlState, media types
//! ├── processing/   ← AudioGraph, GainController, RingBuffer, RasterSurface, OverlayHandle, stream views
//! └── session/      ← CaptureSession, FrameCompositor, RecordingEngine, PlaybackController, LifecycleCoordinator
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::artifact::{ArtifactMetadata, RecordedArtifact};
pub use models::config::{ArtifactRetention, CaptureConfiguration, OverlayRect, PlaybackPolicy};
pub use models::controls::ControlState;
pub use models::error::CaptureError;
pub use models::media::{AudioLevels, MediaKind, StreamRequest, TrackInfo, VideoFrame};
pub use models::state::{RecorderState, TickOutcome};
pub use processing::audio_graph::{AudioContext, AudioGraph, GainNode, MediaStreamDestination};
pub use processing::gain::GainController;
pub use processing::mixer::AudioMixer;
pub use processing::overlay::{OverlayHandle, OverlayImage, OverlaySlot};
pub use processing::raster::{RasterSurface, SharedSurface};
pub use processing::ring_buffer::RingBuffer;
pub use processing::streams::{CombinedStream, LiveVideoSource, RasterStream};
pub use session::capture::{CaptureSession, SessionContext};
pub use session::compositor::FrameCompositor;
pub use session::lifecycle::LifecycleCoordinator;
pub use session::playback::{PlaybackController, PlaybackSurface};
pub use session::recording::RecordingEngine;
pub use traits::device_provider::{AudioBufferCallback, DeviceProvider, DeviceStream, StreamSink, VideoFrameCallback};
pub use traits::media_encoder::{ChunkSender, EncoderEvent, EncoderFactory, MediaEncoder};
pub use traits::playback_renderer::PlaybackRenderer;
pub use traits::session_delegate::SessionDelegate;
