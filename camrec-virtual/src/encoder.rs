//! Timesliced encoder writing the raw container from [`crate::container`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use camrec_core::models::error::CaptureError;
use camrec_core::processing::streams::CombinedStream;
use camrec_core::traits::media_encoder::{ChunkSender, EncoderEvent, EncoderFactory, MediaEncoder};

use crate::container::{self, StreamHeader};

/// Granularity at which the encoder thread notices `stop()`.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Creates [`VirtualEncoder`]s, or refuses to when configured unavailable.
pub struct VirtualEncoderFactory {
    available: bool,
}

impl VirtualEncoderFactory {
    pub fn new() -> Self {
        Self { available: true }
    }

    /// A factory standing in for a host without a usable recorder.
    pub fn unavailable() -> Self {
        Self { available: false }
    }
}

impl Default for VirtualEncoderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderFactory for VirtualEncoderFactory {
    fn create(&self, stream: &CombinedStream) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        if !self.available {
            return Err(CaptureError::RecorderUnavailable("no encoder backend".into()));
        }
        if !stream.is_live() {
            return Err(CaptureError::RecorderUnavailable("combined stream has ended".into()));
        }
        if stream.video_tracks().is_empty() || stream.audio_tracks().is_empty() {
            return Err(CaptureError::RecorderUnavailable("combined stream is missing a track".into()));
        }
        Ok(Box::new(VirtualEncoder::new(stream.clone())))
    }
}

/// Records one combined stream into raw container chunks.
///
/// A dedicated thread wakes every timeslice, snapshots the raster when a new
/// frame has been presented, drains the mixed audio, and pushes the slice.
/// It ends the take itself once the stream stops being live.
pub struct VirtualEncoder {
    stream: CombinedStream,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl VirtualEncoder {
    pub fn new(stream: CombinedStream) -> Self {
        Self {
            stream,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    fn header(&self) -> StreamHeader {
        let frame = self.stream.video().snapshot();
        StreamHeader {
            width: frame.width,
            height: frame.height,
            sample_rate: self.stream.audio().sample_rate().round() as u32,
            channels: 1,
        }
    }
}

impl MediaEncoder for VirtualEncoder {
    fn mime_type(&self) -> &str {
        container::MIME_TYPE
    }

    fn start(&mut self, timeslice: Duration, sink: ChunkSender) -> Result<(), CaptureError> {
        if self.handle.is_some() {
            return Err(CaptureError::RecorderUnavailable("encoder already started".into()));
        }

        // Audio queued before the take began does not belong to it.
        self.stream.audio().drain();
        sink.send(EncoderEvent::Data(self.header().encode()))
            .map_err(|_| CaptureError::EncodingFailed("chunk queue closed before start".into()))?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let stream = self.stream.clone();

        let handle = thread::Builder::new()
            .name("virtual-encoder".into())
            .spawn(move || encode_loop(stream, running, timeslice, sink))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::EncodingFailed(format!("failed to spawn encoder thread: {}", e))
            })?;

        self.handle = Some(handle);
        log::debug!("Virtual encoder started ({:?} timeslice)", timeslice);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptureError::EncodingFailed("encoder thread panicked".into())),
            None => Ok(()),
        }
    }
}

impl Drop for VirtualEncoder {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn encode_loop(stream: CombinedStream, running: Arc<AtomicBool>, timeslice: Duration, sink: ChunkSender) {
    let mut last_index = 0u64;
    let mut next = Instant::now() + timeslice;

    loop {
        while running.load(Ordering::SeqCst) && stream.is_live() && Instant::now() < next {
            thread::sleep(POLL_INTERVAL.min(next.saturating_duration_since(Instant::now())));
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
        if !stream.is_live() {
            log::info!("Combined stream ended; closing take");
            break;
        }

        if sink.send(EncoderEvent::Data(slice(&stream, &mut last_index))).is_err() {
            log::warn!("Chunk queue disconnected; encoder exiting");
            return;
        }
        next += timeslice;
    }

    let _ = sink.send(EncoderEvent::Data(slice(&stream, &mut last_index)));
    let _ = sink.send(EncoderEvent::Closed);
}

/// Encode everything new since the previous slice; empty when nothing changed.
fn slice(stream: &CombinedStream, last_index: &mut u64) -> Vec<u8> {
    let index = stream.video().frame_index();
    let frame = if index > *last_index {
        *last_index = index;
        Some(stream.video().snapshot())
    } else {
        None
    };
    let audio = stream.audio().drain();

    if frame.is_none() && audio.is_empty() {
        return Vec::new();
    }
    container::encode_slice(frame.as_ref(), &audio)
}
