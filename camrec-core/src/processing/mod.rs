pub mod audio_graph;
pub mod gain;
pub mod mixer;
pub mod overlay;
pub mod raster;
pub mod ring_buffer;
pub mod streams;
