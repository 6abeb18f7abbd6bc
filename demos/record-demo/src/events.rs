use serde::Serialize;

use camrec_core::{ArtifactMetadata, CaptureError, ControlState, RecorderState, SessionDelegate};

#[derive(Serialize)]
struct Event<'a, T: Serialize> {
    event: &'a str,
    payload: &'a T,
}

#[derive(Serialize)]
struct ErrorPayload {
    message: String,
    device_access: bool,
}

/// Print one event as a JSON line on stdout.
pub fn emit<T: Serialize>(event: &str, payload: &T) {
    match serde_json::to_string(&Event { event, payload }) {
        Ok(line) => println!("{}", line),
        Err(e) => log::warn!("Failed to serialize {} event: {}", event, e),
    }
}

/// Session delegate that forwards every event to stdout.
pub struct StdoutDelegate;

impl SessionDelegate for StdoutDelegate {
    fn on_controls_changed(&self, controls: &ControlState) {
        emit("controls", controls);
    }

    fn on_recorder_state_changed(&self, state: &RecorderState) {
        emit("recorder", state);
    }

    fn on_artifact_finalized(&self, metadata: &ArtifactMetadata) {
        emit("artifact", metadata);
    }

    fn on_error(&self, error: &CaptureError) {
        emit(
            "error",
            &ErrorPayload {
                message: error.to_string(),
                device_access: error.is_device_access(),
            },
        );
    }
}
