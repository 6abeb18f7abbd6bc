use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::media::{StreamRequest, TrackInfo, VideoFrame};

/// Callback invoked when a microphone buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of channels (1 = mono, 2 = stereo interleaved).
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Callback invoked with every camera frame.
pub type VideoFrameCallback = Arc<dyn Fn(VideoFrame) + Send + Sync + 'static>;

/// Where a live device stream delivers its media.
#[derive(Clone)]
pub struct StreamSink {
    pub on_video: VideoFrameCallback,
    pub on_audio: AudioBufferCallback,
}

/// A live combined camera + microphone stream handed out by a [`DeviceProvider`].
///
/// Implementations deliver media on their own threads; keep callback work minimal.
pub trait DeviceStream: Send {
    /// The tracks this stream carries.
    fn tracks(&self) -> Vec<TrackInfo>;

    /// Begin delivering frames and audio buffers into `sink`.
    fn start(&mut self, sink: StreamSink) -> Result<(), CaptureError>;

    /// Stop every track and release the hardware. Must be idempotent.
    fn stop_all_tracks(&mut self);

    /// Whether at least one track is still live.
    fn is_live(&self) -> bool;
}

/// Platform entry point for acquiring capture devices.
pub trait DeviceProvider: Send + Sync {
    /// Whether a capture device is present at all.
    fn is_available(&self) -> bool;

    /// Request combined access to camera and microphone.
    ///
    /// Blocks until the user grants or denies access. Fails with
    /// [`CaptureError::PermissionDenied`] or [`CaptureError::DeviceNotAvailable`].
    fn acquire(&self, request: &StreamRequest) -> Result<Box<dyn DeviceStream>, CaptureError>;
}
