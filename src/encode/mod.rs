//! Video encoding of finished frame directories.

/// `ffmpeg` invocation over a numbered PNG sequence.
pub mod ffmpeg;
