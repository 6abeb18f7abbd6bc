pub mod capture;
pub mod compositor;
pub mod lifecycle;
pub mod playback;
pub mod recording;
