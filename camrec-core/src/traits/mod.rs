pub mod device_provider;
pub mod media_encoder;
pub mod playback_renderer;
pub mod session_delegate;
