//! Producer/worker pipeline that turns input files into numbered frame images.

pub mod cancel;
pub mod daily;
pub mod progress;
pub mod run;
pub mod target;
