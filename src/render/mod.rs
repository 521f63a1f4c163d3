//! CPU rasterization of frames.

pub mod cpu;
pub mod text;
