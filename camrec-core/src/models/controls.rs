use serde::Serialize;

/// Enablement of the four user-facing controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    pub start: bool,
    pub stop_recording: bool,
    pub stop_video: bool,
    pub play: bool,
}

impl ControlState {
    /// Controls before anything was recorded.
    pub fn initial() -> Self {
        Self {
            start: true,
            stop_recording: false,
            stop_video: false,
            play: false,
        }
    }

    /// Controls while a take is being recorded.
    pub fn recording() -> Self {
        Self {
            start: false,
            stop_recording: true,
            stop_video: true,
            play: false,
        }
    }

    /// Controls after a stop. Playback is offered once an artifact exists.
    pub fn stopped(has_artifact: bool) -> Self {
        Self {
            play: has_artifact,
            ..Self::initial()
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::initial()
    }
}
