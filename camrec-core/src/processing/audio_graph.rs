//! Microphone audio graph: source → gain → media stream destination.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::media::{AudioLevels, MediaKind, TrackInfo};
use crate::processing::mixer::AudioMixer;
use crate::processing::ring_buffer::RingBuffer;
use crate::traits::device_provider::AudioBufferCallback;

/// Seconds of mixed audio a destination holds before evicting the oldest samples.
const DESTINATION_SECONDS: f64 = 5.0;

/// Processing context shared by every graph built during the coordinator's lifetime.
///
/// Created lazily on the first capture and reused afterwards.
#[derive(Debug)]
pub struct AudioContext {
    mixer: AudioMixer,
}

impl AudioContext {
    pub fn new(sample_rate: f64) -> Arc<Self> {
        log::debug!("Creating audio context at {} Hz", sample_rate);
        Arc::new(Self {
            mixer: AudioMixer::new(sample_rate),
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.mixer.target_sample_rate
    }

    pub fn create_gain(&self) -> GainNode {
        GainNode::new(1.0)
    }

    pub fn create_media_stream_destination(&self) -> MediaStreamDestination {
        let capacity = (self.sample_rate() * DESTINATION_SECONDS) as usize;
        MediaStreamDestination {
            buffer: Arc::new(Mutex::new(RingBuffer::new(capacity))),
            levels: Arc::new(Mutex::new(AudioLevels::default())),
            track: TrackInfo::new(MediaKind::Audio, "mixed microphone"),
            sample_rate: self.sample_rate(),
        }
    }
}

/// Scales the signal passing through it by a shared, live-adjustable factor.
#[derive(Debug, Clone)]
pub struct GainNode {
    gain: Arc<Mutex<f32>>,
}

impl GainNode {
    fn new(gain: f32) -> Self {
        Self {
            gain: Arc::new(Mutex::new(gain)),
        }
    }

    pub fn value(&self) -> f32 {
        *self.gain.lock()
    }

    pub fn set_value(&self, gain: f32) {
        *self.gain.lock() = gain;
    }
}

/// Terminal node whose output is a recordable mono audio track.
#[derive(Debug, Clone)]
pub struct MediaStreamDestination {
    buffer: Arc<Mutex<RingBuffer>>,
    levels: Arc<Mutex<AudioLevels>>,
    track: TrackInfo,
    sample_rate: f64,
}

impl MediaStreamDestination {
    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Take every mixed sample produced since the last drain.
    pub fn drain(&self) -> Vec<f32> {
        self.buffer.lock().drain()
    }

    pub fn available(&self) -> usize {
        self.buffer.lock().count()
    }

    /// Level of the most recent buffer that went through the graph.
    pub fn levels(&self) -> AudioLevels {
        *self.levels.lock()
    }

    fn push(&self, samples: &[f32]) {
        let levels = AudioLevels {
            rms: AudioMixer::rms_level(samples),
            peak: AudioMixer::peak_level(samples),
        };
        *self.levels.lock() = levels;

        let mut buffer = self.buffer.lock();
        let dropped_before = buffer.dropped();
        buffer.write(samples);
        if buffer.dropped() > dropped_before {
            log::warn!(
                "Mixed audio overflow: {} samples dropped",
                buffer.dropped() - dropped_before
            );
        }
    }
}

/// A wired microphone graph for one capture session.
#[derive(Debug, Clone)]
pub struct AudioGraph {
    source_track: Option<TrackInfo>,
    gain: GainNode,
    destination: MediaStreamDestination,
    mixer: AudioMixer,
}

impl AudioGraph {
    /// Build `source → gain → destination` with fresh nodes from `context`.
    pub fn connect(context: &AudioContext, source_track: Option<TrackInfo>) -> Self {
        Self {
            source_track,
            gain: context.create_gain(),
            destination: context.create_media_stream_destination(),
            mixer: context.mixer.clone(),
        }
    }

    pub fn source_track(&self) -> Option<&TrackInfo> {
        self.source_track.as_ref()
    }

    pub fn gain(&self) -> &GainNode {
        &self.gain
    }

    pub fn destination(&self) -> &MediaStreamDestination {
        &self.destination
    }

    /// Run one device buffer through the graph.
    pub fn process(&self, samples: &[f32], sample_rate: f64, channels: u16) {
        let mono = AudioMixer::downmix_to_mono(samples, channels as usize);
        let mut resampled = self.mixer.resample(&mono, sample_rate);
        AudioMixer::apply_gain(&mut resampled, self.gain.value());
        self.destination.push(&resampled);
    }

    /// Callback to hand to the device stream as its audio source.
    pub fn source_callback(&self) -> AudioBufferCallback {
        let graph = self.clone();
        Arc::new(move |samples: &[f32], sample_rate: f64, channels: u16| {
            graph.process(samples, sample_rate, channels);
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn graph_applies_live_gain() {
        let context = AudioContext::new(48000.0);
        let graph = AudioGraph::connect(&context, None);

        graph.gain().set_value(0.5);
        graph.process(&[0.8, -0.8], 48000.0, 1);
        let out = graph.destination().drain();

        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], -0.4, epsilon = 1e-6);
    }

    #[test]
    fn stereo_input_is_downmixed_and_resampled() {
        let context = AudioContext::new(48000.0);
        let graph = AudioGraph::connect(&context, None);

        graph.process(&[0.5, 0.5, 0.5, 0.5], 24000.0, 2);

        assert_eq!(graph.destination().available(), 4);
    }

    #[test]
    fn levels_reflect_post_gain_signal() {
        let context = AudioContext::new(48000.0);
        let graph = AudioGraph::connect(&context, None);

        graph.gain().set_value(0.25);
        (graph.source_callback())(&[1.0, -1.0], 48000.0, 1);

        let levels = graph.destination().levels();
        assert_abs_diff_eq!(levels.peak, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(levels.rms, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn each_graph_gets_fresh_nodes() {
        let context = AudioContext::new(48000.0);
        let first = AudioGraph::connect(&context, None);
        let second = AudioGraph::connect(&context, None);

        first.gain().set_value(0.1);
        assert_eq!(second.gain().value(), 1.0);
        assert_ne!(first.destination().track().id, second.destination().track().id);
    }
}
