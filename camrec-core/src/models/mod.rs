pub mod artifact;
pub mod config;
pub mod controls;
pub mod error;
pub mod media;
pub mod state;
