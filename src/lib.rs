//! Animated reveals of solved polygon puzzles.
//!
//! A run loads one or more puzzle documents and walks each one side by side until every shape is
//! filled:
//!
//! - [`Walk`] schedules the reveal order for one [`Puzzle`]
//! - [`Framer`] wraps it with appear/decay ramps and global frame numbers
//! - [`render_frames`] renders every frame in parallel into `frame_%08d.png` files
//! - [`encode_frames`] hands the finished sequence to `ffmpeg`
#![forbid(unsafe_code)]

mod foundation;

/// Video encoding of frame sequences.
pub mod encode;
/// Input enumeration, cancellation, progress and the render worker pool.
pub mod pipeline;
/// Puzzle documents and the validated model.
pub mod puzzle;
/// Frame rasterization.
pub mod render;
/// Reveal scheduling and frame numbering.
pub mod schedule;

pub use crate::foundation::core::{FrameNo, Point, Rect, Rgb8, Vec2};
pub use crate::foundation::error::{VertexError, VertexResult};

pub use crate::encode::ffmpeg::{EncodeOpts, EncodeProfile, encode_frames, output_path_for};
pub use crate::pipeline::cancel::CancelToken;
pub use crate::pipeline::daily::{DailyEntry, DailyIndex, DailyStats, run_daily};
pub use crate::pipeline::run::{Estimate, PipelineOpts, RunStats, estimate, render_frames};
pub use crate::pipeline::target::Target;
pub use crate::puzzle::document::Document;
pub use crate::puzzle::model::{Puzzle, Shape, Vertex};
pub use crate::render::cpu::{RenderContext, RenderOpts, save_png};
pub use crate::render::text::FontSource;
pub use crate::schedule::framer::{Frame, FrameClock, Framer, FramerOpts, Ramp};
pub use crate::schedule::walk::Walk;
