use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::media::StreamRequest;

/// Where and how large the overlay image is drawn on the raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for OverlayRect {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        }
    }
}

/// How many finalized artifacts the recording engine keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "count", rename_all = "snake_case")]
pub enum ArtifactRetention {
    KeepAll,
    KeepLast(usize),
}

/// Which artifacts a playback surface is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPolicy {
    /// Stitch every retained take together, oldest first.
    ConcatenateAll,
    LatestOnly,
}

/// Configuration for a capture/record lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Raster surface width in pixels (default: 640).
    pub surface_width: u32,

    /// Raster surface height in pixels (default: 480).
    pub surface_height: u32,

    /// Compositor tick rate in Hz (default: 60).
    pub refresh_rate_hz: u32,

    /// Interval between emitted recording chunks in milliseconds (default: 100).
    pub timeslice_ms: u64,

    /// Sample rate of the audio graph in Hz (default: 48000).
    pub audio_sample_rate: f64,

    /// Gain control value before the user touches it (default: 1.0).
    pub initial_gain: f32,

    /// Lower bound of the gain control (default: 0.0).
    pub gain_min: f32,

    /// Upper bound of the gain control (default: 1.0).
    pub gain_max: f32,

    pub overlay_rect: OverlayRect,

    /// Capacity of the encoder → recorder chunk queue (default: 64).
    pub chunk_queue_capacity: usize,

    pub artifact_retention: ArtifactRetention,

    pub playback_policy: PlaybackPolicy,

    /// Maximum attached playback surfaces (None = unlimited).
    pub max_playback_surfaces: Option<usize>,

    /// Tracks requested from the capture device.
    pub request: StreamRequest,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err("surface dimensions must be positive".into());
        }
        if !(1..=240).contains(&self.refresh_rate_hz) {
            return Err(format!("unsupported refresh rate: {}", self.refresh_rate_hz));
        }
        if self.timeslice_ms < 10 {
            return Err(format!("timeslice too short: {}ms", self.timeslice_ms));
        }
        if !(self.audio_sample_rate > 0.0) {
            return Err("audio sample rate must be positive".into());
        }
        if !self.gain_min.is_finite() || !self.gain_max.is_finite() || self.gain_min >= self.gain_max {
            return Err(format!("invalid gain range: [{}, {}]", self.gain_min, self.gain_max));
        }
        if !(self.gain_min..=self.gain_max).contains(&self.initial_gain) {
            return Err(format!("initial gain {} outside gain range", self.initial_gain));
        }
        if self.chunk_queue_capacity == 0 {
            return Err("chunk queue capacity must be positive".into());
        }
        if self.artifact_retention == ArtifactRetention::KeepLast(0) {
            return Err("artifact retention must keep at least one artifact".into());
        }
        if self.max_playback_surfaces == Some(0) {
            return Err("max playback surfaces must be positive".into());
        }
        if self.overlay_rect.width == 0 || self.overlay_rect.height == 0 {
            return Err("overlay rect must have a non-zero size".into());
        }
        if !self.request.audio || !self.request.video {
            return Err("capture request must include both audio and video".into());
        }
        Ok(())
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to parse configuration: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate_hz as f64)
    }

    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            surface_width: 640,
            surface_height: 480,
            refresh_rate_hz: 60,
            timeslice_ms: 100,
            audio_sample_rate: 48000.0,
            initial_gain: 1.0,
            gain_min: 0.0,
            gain_max: 1.0,
            overlay_rect: OverlayRect::default(),
            chunk_queue_capacity: 64,
            artifact_retention: ArtifactRetention::KeepAll,
            playback_policy: PlaybackPolicy::ConcatenateAll,
            max_playback_surfaces: None,
            request: StreamRequest::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CaptureConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_gain_range() {
        let config = CaptureConfiguration {
            gain_min: 2.0,
            gain_max: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_initial_gain_outside_range() {
        let config = CaptureConfiguration {
            initial_gain: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_retention() {
        let config = CaptureConfiguration {
            artifact_retention: ArtifactRetention::KeepLast(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_audio_only_request() {
        let config = CaptureConfiguration {
            request: StreamRequest {
                video: false,
                audio: true,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = CaptureConfiguration::from_json(
            r#"{"surface_width": 320, "artifact_retention": {"policy": "keep_last", "count": 2}}"#,
        )
        .unwrap();
        assert_eq!(config.surface_width, 320);
        assert_eq!(config.surface_height, 480);
        assert_eq!(config.artifact_retention, ArtifactRetention::KeepLast(2));
        assert_eq!(config.overlay_rect, OverlayRect::default());
    }

    #[test]
    fn json_with_invalid_values_is_rejected() {
        let err = CaptureConfiguration::from_json(r#"{"refresh_rate_hz": 0}"#).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }

    #[test]
    fn tick_interval_follows_refresh_rate() {
        let config = CaptureConfiguration {
            refresh_rate_hz: 50,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }
}
