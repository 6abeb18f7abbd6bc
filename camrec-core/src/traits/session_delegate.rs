use crate::models::artifact::ArtifactMetadata;
use crate::models::controls::ControlState;
use crate::models::error::CaptureError;
use crate::models::state::RecorderState;

/// Event delegate for lifecycle notifications.
///
/// Methods may be called from the recorder's consumer thread, not only from the
/// thread driving the coordinator. Implementations should marshal to the UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called whenever control enablement changes.
    fn on_controls_changed(&self, controls: &ControlState);

    /// Called when the recording engine changes state.
    fn on_recorder_state_changed(&self, state: &RecorderState);

    /// Called when a take has been finalized into an artifact.
    fn on_artifact_finalized(&self, metadata: &ArtifactMetadata);

    /// Called when a start sequence or playback fails.
    fn on_error(&self, error: &CaptureError);
}
