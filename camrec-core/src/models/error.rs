use thiserror::Error;

/// Errors that can occur while capturing, compositing, recording or playing back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("recorder unavailable: {0}")]
    RecorderUnavailable(String),

    #[error("capture session already started")]
    AlreadyStarted,

    #[error("image decode failed: {0}")]
    ImageDecodeFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Whether this error means the capture device could not be opened
    /// (the user refused access or no hardware is present).
    pub fn is_device_access(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::DeviceNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_access_classification() {
        assert!(CaptureError::PermissionDenied.is_device_access());
        assert!(CaptureError::DeviceNotAvailable.is_device_access());
        assert!(!CaptureError::AlreadyStarted.is_device_access());
        assert!(!CaptureError::RecorderUnavailable("no codec".into()).is_device_access());
    }

    #[test]
    fn messages_carry_detail() {
        let err = CaptureError::RecorderUnavailable("no video track".into());
        assert_eq!(err.to_string(), "recorder unavailable: no video track");
    }
}
