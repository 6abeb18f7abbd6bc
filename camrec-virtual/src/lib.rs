//! # camrec-virtual
//!
//! Software backend for camrec-core. Runs anywhere, needs no hardware.
//!
//! Provides:
//! - `VirtualDevices`: synthetic camera (gradient test pattern) and microphone (sine tone)
//! - `VirtualEncoderFactory`: timesliced raw chunk encoder (`video/x-camrec-raw`)
//! - `MemoryRenderer`: playback host that validates and holds attached surfaces
//! - `container`: the raw chunk format and a reader for it
//!
//! ## Usage
//! ```ignore
//! use camrec_core::{CaptureConfiguration, LifecycleCoordinator};
//! use camrec_virtual::{MemoryRenderer, VirtualDevices, VirtualEncoderFactory};
//!
//! let mut coordinator = LifecycleCoordinator::new(
//!     CaptureConfiguration::default(),
//!     VirtualDevices::default(),
//!     VirtualEncoderFactory::new(),
//!     MemoryRenderer::new(),
//! )?;
//! coordinator.start_requested()?;
//! ```

pub mod container;
pub mod devices;
pub mod encoder;
pub mod renderer;

pub use devices::{PermissionPolicy, VirtualDeviceConfig, VirtualDeviceStream, VirtualDevices};
pub use encoder::{VirtualEncoder, VirtualEncoderFactory};
pub use renderer::{AttachedSurface, MemoryRenderer};
