use parking_lot::Mutex;

use crate::processing::audio_graph::GainNode;

struct GainState {
    value: f32,
    node: Option<GainNode>,
}

/// Holds the microphone gain control value and forwards it to the live gain node.
///
/// The control value outlives sessions: a freshly wired graph starts at whatever
/// the control currently reads. Setting the gain with no session only moves the control.
pub struct GainController {
    min: f32,
    max: f32,
    state: Mutex<GainState>,
}

impl GainController {
    pub fn new(initial: f32, min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            state: Mutex::new(GainState {
                value: initial.clamp(min, max),
                node: None,
            }),
        }
    }

    /// Set the gain, clamped to the control's bounds, and apply it immediately
    /// to the live gain node if a session is active.
    ///
    /// Non-finite values are ignored.
    pub fn set_gain(&self, value: f32) {
        if !value.is_finite() {
            log::warn!("Ignoring non-finite gain value: {}", value);
            return;
        }
        let clamped = value.clamp(self.min, self.max);
        let mut state = self.state.lock();
        state.value = clamped;
        match state.node {
            Some(ref node) => node.set_value(clamped),
            None => log::debug!("Gain set to {} with no active session", clamped),
        }
    }

    /// Current control value.
    pub fn value(&self) -> f32 {
        self.state.lock().value
    }

    /// Gain currently applied by the live node, if any.
    pub fn applied_gain(&self) -> Option<f32> {
        self.state.lock().node.as_ref().map(GainNode::value)
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Bind a session's gain node and push the current control value into it.
    pub(crate) fn attach(&self, node: GainNode) {
        let mut state = self.state.lock();
        node.set_value(state.value);
        state.node = Some(node);
    }

    pub(crate) fn detach(&self) {
        self.state.lock().node = None;
    }
}
