//! User-supplied still image drawn on top of the camera frame.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::error::CaptureError;

/// A decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl OverlayImage {
    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CaptureError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CaptureError::ImageDecodeFailed(e.to_string()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self { width, height, rgba }
    }
}

/// What the compositor currently has to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySlot {
    Empty,
    /// An upload was accepted but decoding has not finished; nothing is drawable yet.
    Decoding,
    Ready(Arc<OverlayImage>),
}

struct SlotState {
    slot: OverlaySlot,
    generation: u64,
}

/// Shared handle to the overlay slot.
///
/// Written by the upload path, read by every compositor tick. When uploads
/// overlap, only the most recent one is allowed to land.
#[derive(Clone)]
pub struct OverlayHandle {
    inner: Arc<Mutex<SlotState>>,
}

impl OverlayHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState {
                slot: OverlaySlot::Empty,
                generation: 0,
            })),
        }
    }

    pub fn slot(&self) -> OverlaySlot {
        self.inner.lock().slot.clone()
    }

    /// The drawable image, if decoding has completed.
    pub fn current(&self) -> Option<Arc<OverlayImage>> {
        match &self.inner.lock().slot {
            OverlaySlot::Ready(image) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    pub fn set(&self, image: OverlayImage) {
        let mut state = self.inner.lock();
        state.generation += 1;
        state.slot = OverlaySlot::Ready(Arc::new(image));
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.generation += 1;
        state.slot = OverlaySlot::Empty;
    }

    /// Accept uploaded image bytes and decode them on a worker thread.
    ///
    /// The slot reads `Decoding` until the worker finishes. A failed decode is
    /// logged and leaves the slot `Empty`.
    pub fn load(&self, bytes: Vec<u8>) -> Result<thread::JoinHandle<()>, CaptureError> {
        let generation = self.begin_decode();
        let handle = self.clone();
        thread::Builder::new()
            .name("overlay-decode".into())
            .spawn(move || {
                let result = OverlayImage::decode(&bytes);
                handle.finish_decode(generation, result);
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn decode thread: {}", e)))
    }

    /// Decode on the calling thread.
    pub fn load_blocking(&self, bytes: &[u8]) -> Result<(), CaptureError> {
        let generation = self.begin_decode();
        let result = OverlayImage::decode(bytes);
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.finish_decode(generation, result);
        outcome
    }

    fn begin_decode(&self) -> u64 {
        let mut state = self.inner.lock();
        state.generation += 1;
        state.slot = OverlaySlot::Decoding;
        state.generation
    }

    fn finish_decode(&self, generation: u64, result: Result<OverlayImage, CaptureError>) {
        let mut state = self.inner.lock();
        if state.generation != generation {
            log::debug!("Discarding overlay decode superseded by a newer upload");
            return;
        }
        match result {
            Ok(image) => {
                log::info!("Overlay image ready ({}x{})", image.width, image.height);
                state.slot = OverlaySlot::Ready(Arc::new(image));
            }
            Err(e) => {
                log::error!("Failed to decode overlay image: {}", e);
                state.slot = OverlaySlot::Empty;
            }
        }
    }
}

impl Default for OverlayHandle {
    fn default() -> Self {
        Self::new()
    }
}
