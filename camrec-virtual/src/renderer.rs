use std::sync::Arc;

use parking_lot::Mutex;

use camrec_core::models::error::CaptureError;
use camrec_core::session::playback::PlaybackSurface;
use camrec_core::traits::playback_renderer::PlaybackRenderer;

use crate::container::{self, TakeSummary};

/// A surface currently attached to the renderer.
#[derive(Debug, Clone)]
pub struct AttachedSurface {
    pub surface: PlaybackSurface,
    pub takes: Vec<TakeSummary>,
}

#[derive(Default)]
struct RendererState {
    attached: Vec<AttachedSurface>,
    released: Vec<String>,
}

/// In-memory playback host. Validates the container on attach and keeps
/// every attached surface until it is released.
#[derive(Clone, Default)]
pub struct MemoryRenderer {
    state: Arc<Mutex<RendererState>>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces attached and not yet released, oldest first.
    pub fn attached(&self) -> Vec<AttachedSurface> {
        self.state.lock().attached.clone()
    }

    /// The most recently attached surface.
    pub fn now_playing(&self) -> Option<AttachedSurface> {
        self.state.lock().attached.last().cloned()
    }

    pub fn released(&self) -> Vec<String> {
        self.state.lock().released.clone()
    }
}

impl PlaybackRenderer for MemoryRenderer {
    fn attach(&self, surface: &PlaybackSurface) -> Result<(), CaptureError> {
        if surface.mime_type != container::MIME_TYPE {
            return Err(CaptureError::PlaybackFailed(format!(
                "unsupported media type {}",
                surface.mime_type
            )));
        }
        let takes = container::parse(&surface.data)?;
        log::info!(
            "Playing surface {} ({} takes, {} bytes)",
            surface.id,
            takes.len(),
            surface.data.len()
        );

        self.state.lock().attached.push(AttachedSurface {
            surface: surface.clone(),
            takes,
        });
        Ok(())
    }

    fn release(&self, surface_id: &str) {
        let mut state = self.state.lock();
        let before = state.attached.len();
        state.attached.retain(|a| a.surface.id != surface_id);
        if state.attached.len() < before {
            state.released.push(surface_id.to_string());
            log::debug!("Released playback surface {}", surface_id);
        }
    }
}
