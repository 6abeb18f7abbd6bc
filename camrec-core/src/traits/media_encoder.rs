use std::time::Duration;

use crate::models::error::CaptureError;
use crate::processing::streams::CombinedStream;

/// Events an encoder pushes into the recorder's chunk queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A slice of encoded container data. May be empty.
    Data(Vec<u8>),
    /// Emission is over; no further events follow.
    Closed,
}

pub type ChunkSender = crossbeam_channel::Sender<EncoderEvent>;

/// A chunked media-container recorder bound to one combined stream.
///
/// Contract: after `start`, emits `Data` roughly every `timeslice`. When `stop`
/// is called, or when the combined stream stops being live, it emits any
/// remaining data followed by exactly one `Closed`.
pub trait MediaEncoder: Send {
    /// Container media type of the produced data (e.g. `video/webm`).
    fn mime_type(&self) -> &str;

    fn start(&mut self, timeslice: Duration, sink: ChunkSender) -> Result<(), CaptureError>;

    /// Stop emission. Returns once `Closed` has been sent. Idempotent.
    fn stop(&mut self) -> Result<(), CaptureError>;
}

/// Constructs encoders for combined streams.
pub trait EncoderFactory: Send + Sync {
    /// Fails with [`CaptureError::RecorderUnavailable`] when the stream cannot be recorded.
    fn create(&self, stream: &CombinedStream) -> Result<Box<dyn MediaEncoder>, CaptureError>;
}
