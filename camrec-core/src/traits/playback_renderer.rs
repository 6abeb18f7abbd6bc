use crate::models::error::CaptureError;
use crate::session::playback::PlaybackSurface;

/// Host surface that shows recorded media to the user.
pub trait PlaybackRenderer: Send + Sync {
    /// Attach a new playback surface and start playing it immediately.
    fn attach(&self, surface: &PlaybackSurface) -> Result<(), CaptureError>;

    /// Detach a surface that is no longer referenced.
    fn release(&self, surface_id: &str);
}
