use serde::Serialize;

/// Recording engine state machine.
///
/// State transitions:
/// ```text
/// idle → recording → stopped
///           ↑           │
///           └───────────┘  (a new take may start after a stop)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RecorderState {
    Idle,
    Recording { chunks_buffered: usize },
    Stopped,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Whether `start` is accepted from this state.
    pub fn can_start(&self) -> bool {
        !self.is_recording()
    }
}

/// Outcome of a single compositor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was drawn. `overlay_drawn` reports whether the overlay image was composited.
    Drawn { frame_index: u64, overlay_drawn: bool },
    /// The video source had no frame or was no longer live.
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_can_restart() {
        assert!(RecorderState::Idle.can_start());
        assert!(RecorderState::Stopped.can_start());
        assert!(!RecorderState::Recording { chunks_buffered: 0 }.can_start());
    }

    #[test]
    fn serializes_with_tag() {
        let json = serde_json::to_string(&RecorderState::Recording { chunks_buffered: 3 }).unwrap();
        assert_eq!(json, r#"{"state":"recording","chunks_buffered":3}"#);
    }
}
