/// Pure-math helpers for the microphone path of the audio graph.
///
/// Every operation works on `&[f32]` buffers with no platform dependencies.
/// The graph runs mono at `target_sample_rate`.
#[derive(Debug, Clone)]
pub struct AudioMixer {
    pub target_sample_rate: f64,
}

impl AudioMixer {
    pub fn new(target_sample_rate: f64) -> Self {
        Self { target_sample_rate }
    }

    /// Average interleaved channels down to one.
    pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
        if channels <= 1 {
            return samples.to_vec();
        }
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Resample to the graph rate by linear interpolation between neighbours.
    ///
    /// Buffers already at the graph rate pass through untouched.
    pub fn resample(&self, samples: &[f32], source_sample_rate: f64) -> Vec<f32> {
        let same_rate = (source_sample_rate - self.target_sample_rate).abs() < 0.01;
        if same_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let step = source_sample_rate / self.target_sample_rate;
        let len = (samples.len() as f64 / step) as usize;
        let last = samples.len() - 1;

        (0..len)
            .map(|n| {
                let pos = n as f64 * step;
                let i = (pos as usize).min(last);
                let t = (pos - i as f64) as f32;
                let next = samples[(i + 1).min(last)];
                samples[i] + (next - samples[i]) * t
            })
            .collect()
    }

    /// Scale every sample by `gain` in place.
    pub fn apply_gain(samples: &mut [f32], gain: f32) {
        if gain == 1.0 {
            return;
        }
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }

    /// Little-endian signed 16-bit PCM, clamping to `[-1.0, 1.0]` first.
    pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
        samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .flat_map(i16::to_le_bytes)
            .collect()
    }

    /// Root-mean-square of the buffer; 0 when empty.
    pub fn rms_level(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let energy: f32 = samples.iter().map(|s| s * s).sum();
        (energy / samples.len() as f32).sqrt()
    }

    pub fn peak_level(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}
