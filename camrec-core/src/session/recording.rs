use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::models::artifact::{ArtifactMetadata, RecordedArtifact};
use crate::models::config::ArtifactRetention;
use crate::models::error::CaptureError;
use crate::models::state::RecorderState;
use crate::traits::media_encoder::{EncoderEvent, MediaEncoder};
use crate::traits::session_delegate::SessionDelegate;

/// State shared between the engine and its chunk consumer thread.
struct EngineState {
    state: RecorderState,
    chunks: Vec<Vec<u8>>,
    history: VecDeque<RecordedArtifact>,
    mime_type: String,
    started_at: Option<Instant>,
    /// Set when the encoder refused to start; the consumer then discards the take.
    aborted: bool,
}

impl EngineState {
    fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            chunks: Vec::new(),
            history: VecDeque::new(),
            mime_type: String::new(),
            started_at: None,
            aborted: false,
        }
    }
}

/// Records a combined stream into artifacts.
///
/// Data flow:
/// ```text
/// [MediaEncoder] → bounded queue → [consumer thread] → chunk buffer ─(Closed)→ artifact history
/// ```
///
/// The consumer is the only writer of the chunk buffer. `Closed` is the
/// finalization barrier: the buffered chunks become one artifact, the buffer is
/// cleared and the engine moves to `Stopped`.
pub struct RecordingEngine {
    retention: ArtifactRetention,
    queue_capacity: usize,
    timeslice: Duration,
    shared: Arc<Mutex<EngineState>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    encoder: Option<Box<dyn MediaEncoder>>,
    consumer: Option<thread::JoinHandle<()>>,
}

impl RecordingEngine {
    pub fn new(timeslice: Duration, queue_capacity: usize, retention: ArtifactRetention) -> Self {
        Self {
            retention,
            queue_capacity: queue_capacity.max(1),
            timeslice,
            shared: Arc::new(Mutex::new(EngineState::new())),
            delegate: None,
            encoder: None,
            consumer: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecorderState {
        self.shared.lock().state
    }

    /// Number of chunks buffered for the take in progress.
    pub fn buffered_chunks(&self) -> usize {
        self.shared.lock().chunks.len()
    }

    /// Retained artifacts, oldest first.
    pub fn artifacts(&self) -> Vec<RecordedArtifact> {
        self.shared.lock().history.iter().cloned().collect()
    }

    pub fn artifact_count(&self) -> usize {
        self.shared.lock().history.len()
    }

    pub fn latest_artifact(&self) -> Option<RecordedArtifact> {
        self.shared.lock().history.back().cloned()
    }

    /// Start a new take. Accepted from `Idle` or `Stopped`.
    ///
    /// The consumer is running before the encoder starts, so an encoder may
    /// emit any number of chunks from inside `start`. If the encoder refuses to
    /// start, the engine returns to its previous state and no artifact is added.
    pub fn start(&mut self, mut encoder: Box<dyn MediaEncoder>) -> Result<(), CaptureError> {
        let previous = self.state();
        if !previous.can_start() {
            return Err(CaptureError::ConfigurationFailed(
                "can only start recording from idle or stopped state".into(),
            ));
        }

        // A take that ended on its own still owns its encoder and consumer.
        self.reap();

        let state = {
            let mut s = self.shared.lock();
            s.chunks.clear();
            s.mime_type = encoder.mime_type().to_string();
            s.started_at = Some(Instant::now());
            s.state = RecorderState::Recording { chunks_buffered: 0 };
            s.state
        };

        let (tx, rx) = crossbeam_channel::bounded(self.queue_capacity);
        // Held until the encoder has started, so the queue cannot disconnect
        // before an aborted start is flagged.
        let guard = tx.clone();
        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();
        let retention = self.retention;
        let consumer = thread::Builder::new()
            .name("chunk-consumer".into())
            .spawn(move || Self::consume(rx, shared, delegate, retention));

        let consumer = match consumer {
            Ok(handle) => handle,
            Err(e) => {
                self.restore(previous);
                return Err(CaptureError::Unknown(format!("failed to spawn consumer thread: {}", e)));
            }
        };
        self.notify_state(&state);

        if let Err(e) = encoder.start(self.timeslice, tx) {
            self.shared.lock().aborted = true;
            drop(guard);
            drop(encoder);
            let _ = consumer.join();
            self.restore(previous);
            self.notify_state(&previous);
            return Err(match e {
                CaptureError::RecorderUnavailable(_) => e,
                other => CaptureError::RecorderUnavailable(other.to_string()),
            });
        }

        drop(guard);
        self.consumer = Some(consumer);
        self.encoder = Some(encoder);

        log::info!("Recording started ({})", self.shared.lock().mime_type);
        Ok(())
    }

    fn restore(&self, previous: RecorderState) {
        let mut s = self.shared.lock();
        s.chunks.clear();
        s.started_at = None;
        s.aborted = false;
        s.state = previous;
    }

    /// Stop the take in progress and wait for its artifact.
    ///
    /// Returns the finalized artifact's metadata, or `None` when there was nothing
    /// to stop.
    pub fn stop(&mut self) -> Result<Option<ArtifactMetadata>, CaptureError> {
        if !self.state().is_recording() {
            log::debug!("Recording stop requested while not recording");
            self.reap();
            return Ok(None);
        }

        let stop_result = match self.encoder.as_mut() {
            Some(encoder) => encoder.stop(),
            None => Ok(()),
        };
        if let Err(ref e) = stop_result {
            log::error!("Encoder failed to stop cleanly: {}", e);
        }
        // Dropping the encoder also drops its sender, so the consumer finishes either way.
        self.encoder = None;
        if let Some(handle) = self.consumer.take() {
            let _ = handle.join();
        }

        stop_result?;

        // The consumer always appends the closed take before exiting.
        Ok(self.latest_artifact().map(|a| a.metadata))
    }

    /// Block until the current take has been closed by its encoder.
    ///
    /// Used after the input stream was released without an explicit stop.
    pub fn wait_closed(&mut self) {
        if let Some(handle) = self.consumer.take() {
            let _ = handle.join();
        }
        if let Some(mut encoder) = self.encoder.take() {
            let _ = encoder.stop();
        }
    }

    fn reap(&mut self) {
        if let Some(mut encoder) = self.encoder.take() {
            let _ = encoder.stop();
        }
        if let Some(handle) = self.consumer.take() {
            let _ = handle.join();
        }
    }

    fn notify_state(&self, state: &RecorderState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_recorder_state_changed(state);
        }
    }

    /// Drain the chunk queue until the encoder closes it.
    fn consume(
        rx: Receiver<EncoderEvent>,
        shared: Arc<Mutex<EngineState>>,
        delegate: Option<Arc<dyn SessionDelegate>>,
        retention: ArtifactRetention,
    ) {
        loop {
            match rx.recv() {
                Ok(EncoderEvent::Data(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    let mut s = shared.lock();
                    s.chunks.push(chunk);
                    s.state = RecorderState::Recording {
                        chunks_buffered: s.chunks.len(),
                    };
                }
                Ok(EncoderEvent::Closed) => break,
                Err(_) if shared.lock().aborted => {
                    log::debug!("Take aborted before the encoder started");
                    return;
                }
                Err(_) => {
                    log::warn!("Encoder went away without closing its stream");
                    break;
                }
            }
        }

        let metadata = {
            let mut s = shared.lock();
            let chunks = std::mem::take(&mut s.chunks);
            let duration = s.started_at.take().map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
            let artifact = RecordedArtifact::from_chunks(&chunks, &s.mime_type, duration);
            let metadata = artifact.metadata.clone();

            s.history.push_back(artifact);
            if let ArtifactRetention::KeepLast(keep) = retention {
                while s.history.len() > keep {
                    if let Some(evicted) = s.history.pop_front() {
                        log::debug!("Evicting artifact {}", evicted.id());
                    }
                }
            }
            s.state = RecorderState::Stopped;
            metadata
        };

        log::info!(
            "Recording finalized: {} bytes in {} chunks ({:.2}s)",
            metadata.size_bytes,
            metadata.chunk_count,
            metadata.duration_secs
        );

        if let Some(ref d) = delegate {
            d.on_artifact_finalized(&metadata);
            d.on_recorder_state_changed(&RecorderState::Stopped);
        }
    }
}

impl Drop for RecordingEngine {
    fn drop(&mut self) {
        self.reap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEncoder, RecordingDelegate};

    fn engine() -> RecordingEngine {
        RecordingEngine::new(Duration::from_millis(100), 8, ArtifactRetention::KeepAll)
    }

    #[test]
    fn starts_idle() {
        let engine = engine();
        assert_eq!(engine.state(), RecorderState::Idle);
        assert_eq!(engine.artifact_count(), 0);
    }

    #[test]
    fn full_cycle_produces_one_artifact_from_non_empty_chunks() {
        let mut engine = engine();
        engine
            .start(Box::new(FakeEncoder::with_chunks(vec![vec![1, 2], vec![], vec![3]])))
            .unwrap();
        assert!(engine.state().is_recording());

        let metadata = engine.stop().unwrap().unwrap();

        assert_eq!(engine.state(), RecorderState::Stopped);
        assert_eq!(engine.artifact_count(), 1);
        assert_eq!(engine.buffered_chunks(), 0);
        let artifact = engine.latest_artifact().unwrap();
        // FakeEncoder appends a final [0xff] chunk on stop.
        assert_eq!(&*artifact.data, &[1, 2, 3, 0xff]);
        assert_eq!(metadata.chunk_count, 3);
        assert_eq!(metadata.mime_type, "video/x-test");
    }

    #[test]
    fn repeated_cycles_accumulate_artifacts() {
        let mut engine = engine();
        for _ in 0..2 {
            engine.start(Box::new(FakeEncoder::with_chunks(vec![vec![7]]))).unwrap();
            engine.stop().unwrap();
            assert_eq!(engine.buffered_chunks(), 0);
        }

        assert_eq!(engine.artifact_count(), 2);
        let artifacts = engine.artifacts();
        assert_ne!(artifacts[0].id(), artifacts[1].id());
    }

    #[test]
    fn retention_keeps_last_n() {
        let mut engine = RecordingEngine::new(Duration::from_millis(100), 8, ArtifactRetention::KeepLast(2));
        let mut ids = Vec::new();
        for i in 0..3u8 {
            engine.start(Box::new(FakeEncoder::with_chunks(vec![vec![i]]))).unwrap();
            ids.push(engine.stop().unwrap().unwrap().id);
        }

        let kept: Vec<String> = engine.artifacts().iter().map(|a| a.id().to_string()).collect();
        assert_eq!(kept, ids[1..].to_vec());
    }

    #[test]
    fn stop_while_idle_is_noop() {
        let mut engine = engine();
        assert_eq!(engine.stop().unwrap(), None);
        assert_eq!(engine.state(), RecorderState::Idle);
        assert_eq!(engine.artifact_count(), 0);
    }

    #[test]
    fn start_while_recording_is_rejected() {
        let mut engine = engine();
        engine.start(Box::new(FakeEncoder::with_chunks(vec![]))).unwrap();

        let err = engine.start(Box::new(FakeEncoder::with_chunks(vec![]))).unwrap_err();

        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
        engine.stop().unwrap();
        assert_eq!(engine.artifact_count(), 1);
    }

    #[test]
    fn encoder_start_failure_leaves_engine_idle() {
        let mut engine = engine();
        let err = engine.start(Box::new(FakeEncoder::failing())).unwrap_err();

        assert!(matches!(err, CaptureError::RecorderUnavailable(_)));
        assert_eq!(engine.state(), RecorderState::Idle);
        assert_eq!(engine.artifact_count(), 0);
    }

    #[test]
    fn self_closing_encoder_finalizes_without_stop() {
        let mut engine = engine();
        let encoder = FakeEncoder::with_chunks(vec![vec![5]]);
        let closer = encoder.closer();
        engine.start(Box::new(encoder)).unwrap();

        closer.close();
        engine.wait_closed();

        assert_eq!(engine.state(), RecorderState::Stopped);
        assert_eq!(engine.artifact_count(), 1);
        assert_eq!(engine.stop().unwrap(), None);
    }

    #[test]
    fn delegate_hears_transitions_and_artifact() {
        let delegate = Arc::new(RecordingDelegate::default());
        let mut engine = engine();
        engine.set_delegate(delegate.clone());

        engine.start(Box::new(FakeEncoder::with_chunks(vec![vec![1]]))).unwrap();
        engine.stop().unwrap();

        let states = delegate.recorder_states();
        assert_eq!(states.first(), Some(&RecorderState::Recording { chunks_buffered: 0 }));
        assert_eq!(states.last(), Some(&RecorderState::Stopped));
        assert_eq!(delegate.artifacts().len(), 1);
    }

    #[test]
    fn encoder_may_outrun_queue_capacity_while_starting() {
        let mut engine = RecordingEngine::new(Duration::from_millis(100), 1, ArtifactRetention::KeepAll);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        thread::spawn(move || {
            let started = engine.start(Box::new(FakeEncoder::with_chunks(vec![vec![1], vec![2], vec![3]])));
            let _ = done_tx.send((started, engine));
        });

        let (started, mut engine) = done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("start returned");
        started.unwrap();

        engine.stop().unwrap();
        assert_eq!(&*engine.latest_artifact().unwrap().data, &[1, 2, 3, 0xff]);
    }

    #[test]
    fn refused_start_after_a_take_keeps_history_and_state() {
        let delegate = Arc::new(RecordingDelegate::default());
        let mut engine = engine();
        engine.set_delegate(delegate.clone());
        engine.start(Box::new(FakeEncoder::with_chunks(vec![vec![4]]))).unwrap();
        engine.stop().unwrap();

        let err = engine.start(Box::new(FakeEncoder::failing())).unwrap_err();

        assert!(matches!(err, CaptureError::RecorderUnavailable(_)));
        assert_eq!(engine.state(), RecorderState::Stopped);
        assert_eq!(engine.artifact_count(), 1);
        assert_eq!(engine.buffered_chunks(), 0);
        assert_eq!(delegate.artifacts().len(), 1);
        assert_eq!(delegate.recorder_states().last(), Some(&RecorderState::Stopped));

        engine.start(Box::new(FakeEncoder::with_chunks(vec![vec![5]]))).unwrap();
        engine.stop().unwrap();
        assert_eq!(engine.artifact_count(), 2);
    }
}
