use std::collections::VecDeque;
use std::sync::Arc;

use crate::models::artifact::{sha256_hex, RecordedArtifact};
use crate::models::config::PlaybackPolicy;
use crate::models::error::CaptureError;
use crate::traits::playback_renderer::PlaybackRenderer;

/// A throwaway surface playing recorded media.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSurface {
    pub id: String,
    pub mime_type: String,
    pub data: Arc<[u8]>,
    /// Artifacts stitched into `data`, oldest first.
    pub artifact_ids: Vec<String>,
    pub checksum: String,
}

impl PlaybackSurface {
    fn from_artifacts(artifacts: &[&RecordedArtifact]) -> Option<Self> {
        let latest = artifacts.last()?;
        let data: Vec<u8> = artifacts.iter().flat_map(|a| a.data.iter().copied()).collect();
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: latest.mime_type().to_string(),
            checksum: sha256_hex(&data),
            data: data.into(),
            artifact_ids: artifacts.iter().map(|a| a.id().to_string()).collect(),
        })
    }
}

/// Builds playback surfaces from recorded artifacts and hands them to the host renderer.
pub struct PlaybackController<R: PlaybackRenderer> {
    renderer: R,
    policy: PlaybackPolicy,
    max_surfaces: Option<usize>,
    surfaces: VecDeque<PlaybackSurface>,
}

impl<R: PlaybackRenderer> PlaybackController<R> {
    pub fn new(renderer: R, policy: PlaybackPolicy, max_surfaces: Option<usize>) -> Self {
        Self {
            renderer,
            policy,
            max_surfaces,
            surfaces: VecDeque::new(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Surfaces currently attached, oldest first.
    pub fn surfaces(&self) -> impl Iterator<Item = &PlaybackSurface> {
        self.surfaces.iter()
    }

    /// Create and attach a new surface according to the playback policy.
    ///
    /// Returns `None` without touching the renderer when nothing has been recorded yet.
    pub fn play(&mut self, artifacts: &[RecordedArtifact]) -> Result<Option<PlaybackSurface>, CaptureError> {
        let selected: Vec<&RecordedArtifact> = match self.policy {
            PlaybackPolicy::ConcatenateAll => artifacts.iter().collect(),
            PlaybackPolicy::LatestOnly => artifacts.last().into_iter().collect(),
        };
        let Some(surface) = PlaybackSurface::from_artifacts(&selected) else {
            log::debug!("Playback requested with no recorded artifacts");
            return Ok(None);
        };

        self.renderer.attach(&surface)?;
        log::info!(
            "Playing {} bytes from {} artifact(s)",
            surface.data.len(),
            surface.artifact_ids.len()
        );
        self.surfaces.push_back(surface.clone());

        if let Some(max) = self.max_surfaces {
            while self.surfaces.len() > max {
                if let Some(old) = self.surfaces.pop_front() {
                    self.renderer.release(&old.id);
                }
            }
        }
        Ok(Some(surface))
    }

    /// Release every attached surface.
    pub fn release_all(&mut self) {
        for surface in self.surfaces.drain(..) {
            self.renderer.release(&surface.id);
        }
    }
}
