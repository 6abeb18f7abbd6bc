//! Synthetic camera and microphone.
//!
//! The camera paints a moving gradient test pattern; the microphone plays a
//! stereo sine tone. Both are delivered from one dedicated thread at the
//! configured frame rate, the way a hardware stream would call back.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use camrec_core::models::error::CaptureError;
use camrec_core::models::media::{MediaKind, StreamRequest, TrackInfo, VideoFrame};
use camrec_core::traits::device_provider::{DeviceProvider, DeviceStream, StreamSink};

/// Outcome of the simulated permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionPolicy {
    Granted,
    Denied,
}

/// Parameters of the synthetic devices.
#[derive(Debug, Clone)]
pub struct VirtualDeviceConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub sample_rate: f64,
    pub channels: u16,
    pub tone_hz: f32,
    pub amplitude: f32,
}

impl Default for VirtualDeviceConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fps: 30,
            sample_rate: 44100.0,
            channels: 2,
            tone_hz: 440.0,
            amplitude: 0.5,
        }
    }
}

/// [`DeviceProvider`] handing out synthetic camera + microphone streams.
pub struct VirtualDevices {
    config: VirtualDeviceConfig,
    permission: PermissionPolicy,
    present: bool,
}

impl VirtualDevices {
    pub fn new(config: VirtualDeviceConfig) -> Self {
        Self {
            config,
            permission: PermissionPolicy::Granted,
            present: true,
        }
    }

    pub fn with_permission(mut self, permission: PermissionPolicy) -> Self {
        self.permission = permission;
        self
    }

    /// Simulate a machine with no camera attached.
    pub fn without_hardware(mut self) -> Self {
        self.present = false;
        self
    }
}

impl Default for VirtualDevices {
    fn default() -> Self {
        Self::new(VirtualDeviceConfig::default())
    }
}

impl DeviceProvider for VirtualDevices {
    fn is_available(&self) -> bool {
        self.present
    }

    fn acquire(&self, request: &StreamRequest) -> Result<Box<dyn DeviceStream>, CaptureError> {
        if !self.present {
            return Err(CaptureError::DeviceNotAvailable);
        }
        if self.permission == PermissionPolicy::Denied {
            log::warn!("Virtual device access denied");
            return Err(CaptureError::PermissionDenied);
        }

        let mut tracks = Vec::new();
        if request.video {
            tracks.push(TrackInfo::new(MediaKind::Video, "virtual camera"));
        }
        if request.audio {
            tracks.push(TrackInfo::new(MediaKind::Audio, "virtual microphone"));
        }
        log::info!("Virtual devices acquired ({} tracks)", tracks.len());
        Ok(Box::new(VirtualDeviceStream::new(self.config.clone(), tracks)))
    }
}

/// A live synthetic stream.
pub struct VirtualDeviceStream {
    config: VirtualDeviceConfig,
    tracks: Vec<TrackInfo>,
    running: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl VirtualDeviceStream {
    fn new(config: VirtualDeviceConfig, tracks: Vec<TrackInfo>) -> Self {
        Self {
            config,
            tracks,
            running: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    fn has(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }
}

impl DeviceStream for VirtualDeviceStream {
    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.clone()
    }

    fn start(&mut self, sink: StreamSink) -> Result<(), CaptureError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceNotAvailable);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed("virtual stream already running".into()));
        }

        let running = Arc::clone(&self.running);
        let config = self.config.clone();
        let (video, audio) = (self.has(MediaKind::Video), self.has(MediaKind::Audio));

        let handle = thread::Builder::new()
            .name("virtual-devices".into())
            .spawn(move || device_loop(running, config, sink, video, audio))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn device thread: {}", e)))?;

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    fn stop_all_tracks(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
            log::info!("Virtual devices released");
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for VirtualDeviceStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

fn device_loop(running: Arc<AtomicBool>, config: VirtualDeviceConfig, sink: StreamSink, video: bool, audio: bool) {
    let period = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let frames_per_tick = (config.sample_rate / config.fps.max(1) as f64).round() as usize;
    let mut index = 0u64;
    let mut phase = 0.0f32;

    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        if video {
            (sink.on_video)(test_pattern(config.width, config.height, index));
        }
        if audio {
            let samples = sine_block(&config, frames_per_tick, &mut phase);
            (sink.on_audio)(&samples, config.sample_rate, config.channels);
        }
        index += 1;

        if let Some(rest) = period.checked_sub(tick_start.elapsed()) {
            thread::sleep(rest);
        }
    }
}

/// Gradient test pattern whose blue channel advances with `index`.
pub fn test_pattern(width: u32, height: u32, index: u64) -> VideoFrame {
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    let blue = (index.wrapping_mul(4) % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            rgba.push((x * 255 / width.max(1)) as u8);
            rgba.push((y * 255 / height.max(1)) as u8);
            rgba.push(blue);
            rgba.push(255);
        }
    }
    VideoFrame::new(width, height, rgba, index)
}

fn sine_block(config: &VirtualDeviceConfig, frames: usize, phase: &mut f32) -> Vec<f32> {
    let channels = config.channels.max(1) as usize;
    let step = TAU * config.tone_hz / config.sample_rate as f32;
    let mut samples = Vec::with_capacity(frames * channels);
    for _ in 0..frames {
        let value = phase.sin() * config.amplitude;
        samples.extend(std::iter::repeat(value).take(channels));
        *phase = (*phase + step) % TAU;
    }
    samples
}
