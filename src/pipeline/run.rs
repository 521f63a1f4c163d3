use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, mpsc};
use std::time::Duration;

use anyhow::Context as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::foundation::error::{VertexError, VertexResult};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::progress::{Progress, status_line};
use crate::pipeline::target::{file_name, source_date};
use crate::puzzle::model::Puzzle;
use crate::render::cpu::{RenderContext, RenderOpts, save_png};
use crate::render::text::{FontBytes, load_font};
use crate::schedule::framer::{Frame, FrameClock, Framer, FramerOpts};
use crate::schedule::walk::Walk;

/// Options for turning a list of puzzle files into numbered frame images.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Directory receiving `frame_%08d.png` files.
    pub frames_dir: PathBuf,
    /// Render worker count. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Bounded channel capacity between the frame producer and the render workers.
    pub channel_capacity: usize,
    /// Minimum time between progress lines.
    pub progress_interval: Duration,
    /// Seed for the scheduler's tie-break.
    pub seed: u64,
    pub cancel: CancelToken,
    pub framer: FramerOpts,
    pub render: RenderOpts,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            threads: None,
            channel_capacity: 64,
            progress_interval: Duration::from_secs(1),
            seed: 0,
            cancel: CancelToken::new(),
            framer: FramerOpts::default(),
            render: RenderOpts::default(),
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Input files whose frames were all produced.
    pub files: usize,
    /// Distinct frames rendered.
    pub jobs: u64,
    /// Frame files on disk, repeats included.
    pub frames_written: u64,
    /// Frame numbers handed out; equals `frames_written` on success.
    pub frames_total: u64,
}

/// One unit of render work: an owned frame plus what the status line and footer need.
#[derive(Debug)]
struct FrameJob {
    frame: Frame,
    source_name: String,
    source_date: String,
    shapes_left: usize,
    files_left: usize,
}

/// Schedule every file in order and write its frames into `opts.frames_dir`.
///
/// All files are loaded and validated before any frame is written. Frame numbers run
/// contiguously from zero across the files. Cancellation is checked before each file; frames of
/// admitted files are always written out.
#[tracing::instrument(skip_all, fields(files = files.len(), seed = opts.seed))]
pub fn render_frames(files: &[PathBuf], opts: &PipelineOpts) -> VertexResult<RunStats> {
    if files.is_empty() {
        return Err(VertexError::validation("no input files to render"));
    }
    let remaining = count_remaining(files)?;
    let total_shapes = remaining.iter().sum::<usize>();
    tracing::info!(total_shapes, "loaded inputs");

    prepare_frames_dir(&opts.frames_dir)?;
    let font = load_font(&opts.render.font)?;
    if let Some(f) = &font {
        tracing::debug!(bytes = f.byte_len(), "overlay font loaded");
    }
    let pool = build_thread_pool(opts.threads)?;
    let cap = opts.channel_capacity.max(1);

    std::thread::scope(|scope| -> VertexResult<RunStats> {
        let (tx, rx) = mpsc::sync_channel::<FrameJob>(cap);

        let producer = scope.spawn(move || produce(files, &remaining, opts, tx));

        let jobs = AtomicU64::new(0);
        let written = AtomicU64::new(0);
        let progress = Mutex::new(Progress::new(opts.progress_interval));
        let work = WorkerCtx {
            frames_dir: &opts.frames_dir,
            render: &opts.render,
            font: font.as_ref(),
            jobs: &jobs,
            written: &written,
            progress: &progress,
        };

        let consume_res = pool.install(|| {
            rx.into_iter().par_bridge().try_for_each_init(
                || None::<RenderContext>,
                |slot, job| work.handle(slot, job),
            )
        });

        let produce_res = producer
            .join()
            .map_err(|_| VertexError::render("frame producer thread panicked"))?;

        consume_res?;
        let (files_done, frames_total) = produce_res?;
        let stats = RunStats {
            files: files_done,
            jobs: jobs.load(Ordering::Relaxed),
            frames_written: written.load(Ordering::Relaxed),
            frames_total,
        };
        tracing::info!(?stats, "frames written");
        Ok(stats)
    })
}

/// Producer side: one walk + framer per file, feeding jobs into the bounded channel.
fn produce(
    files: &[PathBuf],
    remaining: &[usize],
    opts: &PipelineOpts,
    tx: mpsc::SyncSender<FrameJob>,
) -> VertexResult<(usize, u64)> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut clock = FrameClock::new();
    let final_hold = opts.framer.final_hold(files.len());
    let mut done = 0;

    for (i, path) in files.iter().enumerate() {
        if opts.cancel.is_cancelled() {
            tracing::info!(admitted = done, skipped = files.len() - done, "cancelled");
            break;
        }
        let shapes_after = remaining[i + 1..].iter().sum::<usize>();
        let ctx = FileCtx {
            path,
            files_left: files.len() - i - 1,
            shapes_after,
            final_hold,
        };
        produce_file(&ctx, opts, &mut rng, &mut clock, &tx)?;
        done += 1;
    }
    Ok((done, clock.total()))
}

struct FileCtx<'a> {
    path: &'a Path,
    files_left: usize,
    shapes_after: usize,
    final_hold: u64,
}

#[tracing::instrument(skip_all, fields(file = %ctx.path.display()))]
fn produce_file(
    ctx: &FileCtx<'_>,
    opts: &PipelineOpts,
    rng: &mut StdRng,
    clock: &mut FrameClock,
    tx: &mpsc::SyncSender<FrameJob>,
) -> VertexResult<()> {
    let puzzle = Puzzle::from_path(ctx.path)?;
    let source_name = file_name(ctx.path);
    let date = source_date(ctx.path);
    let first = clock.total();

    let walk = Walk::new(puzzle, rng);
    for frame in Framer::new(walk, opts.framer.clone(), ctx.final_hold, clock) {
        let job = FrameJob {
            shapes_left: ctx.shapes_after + frame.remaining,
            frame,
            source_name: source_name.clone(),
            source_date: date.clone(),
            files_left: ctx.files_left,
        };
        tx.send(job)
            .map_err(|_| VertexError::render("render workers stopped accepting frames"))?;
    }
    tracing::info!(frames = clock.total() - first, "file scheduled");
    Ok(())
}

struct WorkerCtx<'a> {
    frames_dir: &'a Path,
    render: &'a RenderOpts,
    font: Option<&'a FontBytes>,
    jobs: &'a AtomicU64,
    written: &'a AtomicU64,
    progress: &'a Mutex<Progress>,
}

impl WorkerCtx<'_> {
    fn handle(&self, slot: &mut Option<RenderContext>, job: FrameJob) -> VertexResult<()> {
        if slot.is_none() {
            *slot = Some(RenderContext::new(self.render.clone(), self.font)?);
        }
        let Some(ctx) = slot.as_mut() else {
            return Err(VertexError::render("worker renderer unavailable"));
        };

        let img = ctx.render(&job.frame, &job.source_date)?;
        let mut numbers = job.frame.frame_numbers();
        let Some(first) = numbers.next() else {
            return Ok(());
        };
        let first_path = self.frames_dir.join(first.file_name());
        save_png(&img, &first_path)?;
        let mut written = 1;
        for n in numbers {
            clone_frame(&first_path, &self.frames_dir.join(n.file_name()))?;
            written += 1;
        }
        tracing::debug!(frame = first.0, repeats = written, "frame written");

        self.jobs.fetch_add(1, Ordering::Relaxed);
        self.written.fetch_add(written, Ordering::Relaxed);
        report_progress(self.progress, || {
            status_line(
                &job.source_name,
                &first.file_name(),
                job.shapes_left,
                job.files_left,
            )
        });
        Ok(())
    }
}

/// Progress keeps reporting after a worker panicked while holding the lock.
fn report_progress(progress: &Mutex<Progress>, msg: impl FnOnce() -> String) -> bool {
    progress
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .report(msg)
}

fn clone_frame(src: &Path, dst: &Path) -> VertexResult<()> {
    let tmp = dst.with_extension("png.partial");
    std::fs::copy(src, &tmp)
        .with_context(|| format!("copy '{}' to '{}'", src.display(), tmp.display()))?;
    std::fs::rename(&tmp, dst)
        .with_context(|| format!("move frame into place at '{}'", dst.display()))?;
    Ok(())
}

/// Load every file once up front: fail fast on bad input and count unfinished shapes per file.
fn count_remaining(files: &[PathBuf]) -> VertexResult<Vec<usize>> {
    files
        .iter()
        .map(|p| Puzzle::from_path(p).map(|puzzle| puzzle.remaining()))
        .collect()
}

/// Create the frames directory and delete frame files left by an earlier run.
fn prepare_frames_dir(dir: &Path) -> VertexResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create frames dir '{}'", dir.display()))?;
    let mut removed = 0usize;
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("list frames dir '{}'", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("list frames dir '{}'", dir.display()))?
            .path();
        let name = file_name(&path);
        if name.starts_with("frame_") && (name.ends_with(".png") || name.ends_with(".partial")) {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove stale frame '{}'", path.display()))?;
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::debug!(removed, "cleared stale frames");
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> VertexResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(VertexError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| VertexError::render(format!("failed to build rayon thread pool: {e}")))
}

/// Size of the video a run would produce.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Estimate {
    pub files: usize,
    pub frames: u64,
    /// Distinct source dates among the files.
    pub days: usize,
}

impl Estimate {
    /// Playback length as `h:mm:ss`, rounded down to whole seconds.
    pub fn duration_hms(&self, fps: u32) -> String {
        let secs = self.frames / u64::from(fps.max(1));
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Plan every file's frames without rendering anything.
pub fn estimate(files: &[PathBuf], framer: &FramerOpts, seed: u64) -> VertexResult<Estimate> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut clock = FrameClock::new();
    let final_hold = framer.final_hold(files.len());
    let mut days = BTreeSet::new();
    for path in files {
        let puzzle = Puzzle::from_path(path)?;
        let walk = Walk::new(puzzle, &mut rng);
        Framer::new(walk, framer.clone(), final_hold, &mut clock).for_each(drop);
        days.insert(source_date(path));
    }
    Ok(Estimate {
        files: files.len(),
        frames: clock.total(),
        days: days.len(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/run.rs"]
mod tests;
