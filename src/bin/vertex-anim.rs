use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use vertex_anim::{
    CancelToken, DailyIndex, Document, EncodeOpts, EncodeProfile, FontSource, PipelineOpts,
    RenderOpts, Target, VertexError, encode_frames, estimate, output_path_for, render_frames,
    run_daily,
};

#[derive(Parser, Debug)]
#[command(name = "vertex-anim", version, about = "Animate solved polygon puzzles into videos")]
struct Cli {
    /// Log per-frame detail.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a target into frames and encode one video (requires `ffmpeg`).
    Render(RenderArgs),
    /// Report how long the video for a target would be, without rendering.
    Estimate(EstimateArgs),
    /// Render one video per day under the data root, skipping days already indexed.
    Daily(DailyArgs),
    /// Rewrite puzzle documents into the canonical layout.
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Directory walked for `all` and range targets.
    #[arg(long, default_value = "data")]
    data_root: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Directory receiving the numbered frame images.
    #[arg(long, default_value = "frames")]
    frames_dir: PathBuf,

    /// Override render worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Seed for the reveal order; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Font file for overlay text; defaults to a system sans-serif face.
    #[arg(long, conflicts_with = "no_text")]
    font: Option<PathBuf>,

    /// Side of the square drawing canvas before it is scaled into the output frame.
    #[arg(long, default_value_t = 2000)]
    canvas_px: u16,

    /// Draw no overlay text.
    #[arg(long, default_value_t = false)]
    no_text: bool,

    /// Stop admitting new files once this file exists.
    #[arg(long, default_value = "abort.txt")]
    abort_file: PathBuf,

    /// Use the NVIDIA hardware encoder profile.
    #[arg(long, default_value_t = false)]
    nvenc: bool,
}

impl FrameArgs {
    fn pipeline_opts(&self) -> PipelineOpts {
        let seed = self.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, "reveal order seed");
        let font = match (&self.font, self.no_text) {
            (_, true) => FontSource::Disabled,
            (Some(path), false) => FontSource::File(path.clone()),
            (None, false) => FontSource::System,
        };
        PipelineOpts {
            frames_dir: self.frames_dir.clone(),
            threads: self.threads,
            seed,
            cancel: CancelToken::with_sentinel(&self.abort_file),
            render: RenderOpts {
                canvas_px: self.canvas_px,
                font,
                ..RenderOpts::default()
            },
            ..PipelineOpts::default()
        }
    }

    fn encode_opts(&self, out: PathBuf) -> EncodeOpts {
        let mut opts = EncodeOpts::new(out);
        if self.nvenc {
            opts.profile = EncodeProfile::Nvenc;
        }
        opts
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// A puzzle file, `all`, or an inclusive `<lo> <hi>` file name range.
    #[arg(required = true, num_args = 1..=2)]
    target: Vec<String>,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    frames: FrameArgs,

    /// Directory for videos named after the target.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Explicit video path (overrides the name derived from the target).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Stop after writing frames.
    #[arg(long, default_value_t = false)]
    no_encode: bool,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// A puzzle file, `all`, or an inclusive `<lo> <hi>` file name range.
    #[arg(required = true, num_args = 1..=2)]
    target: Vec<String>,

    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args, Debug)]
struct DailyArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    frames: FrameArgs,

    /// Root for per-day videos and `daily.json`.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Puzzle files or directories (searched recursively for `.json`).
    #[arg(default_values = ["data", "extra"])]
    paths: Vec<PathBuf>,

    /// Report what would change without writing.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let res = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Estimate(args) => cmd_estimate(args),
        Command::Daily(args) => cmd_daily(args),
        Command::Normalize(args) => cmd_normalize(args),
    };

    match res {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<VertexError>().and_then(VertexError::encoder_status) {
            Some(code) => {
                eprintln!("Error: {e:#}");
                Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
            }
            None => Err(e),
        },
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let target = Target::from_args(&args.target)?;
    let files = target.files(&args.input.data_root)?;
    let pipeline = args.frames.pipeline_opts();

    let stats = render_frames(&files, &pipeline)?;
    if args.no_encode {
        println!(
            "wrote {} frames to {}",
            stats.frames_written,
            pipeline.frames_dir.display()
        );
        return Ok(());
    }
    if stats.frames_total == 0 {
        anyhow::bail!("no frames were written; nothing to encode");
    }

    let out = args
        .out
        .unwrap_or_else(|| output_path_for(&target, &args.output_dir));
    let enc = args.frames.encode_opts(out);
    encode_frames(&pipeline.frames_dir, &enc)?;
    println!("wrote {}", enc.out_path.display());
    Ok(())
}

fn cmd_estimate(args: EstimateArgs) -> anyhow::Result<()> {
    let target = Target::from_args(&args.target)?;
    let files = target.files(&args.input.data_root)?;
    let est = estimate(&files, &Default::default(), 0)?;
    println!(
        "{} frames: a video {} long for {} days",
        est.frames,
        est.duration_hms(60),
        est.days
    );
    Ok(())
}

fn cmd_daily(args: DailyArgs) -> anyhow::Result<()> {
    let files = Target::All.files(&args.input.data_root)?;
    let mut index = DailyIndex::load(args.output_dir.join("daily.json"))?;
    let pipeline = args.frames.pipeline_opts();
    let encode = args.frames.encode_opts(args.output_dir.join("unused.mp4"));

    let stats = run_daily(&files, &args.output_dir, &mut index, &pipeline, &encode)?;
    println!(
        "{} days rendered, {} already indexed",
        stats.rendered, stats.skipped
    );
    Ok(())
}

fn cmd_normalize(args: NormalizeArgs) -> anyhow::Result<()> {
    let mut changed = 0usize;
    let mut good = 0usize;
    for path in json_files(&args.paths)? {
        let mut doc = Document::from_path(&path)?;
        if doc.normalize()? {
            changed += 1;
            tracing::info!(path = %path.display(), "fixed");
            if !args.dry_run {
                std::fs::write(&path, doc.to_json_string()?)
                    .with_context(|| format!("write '{}'", path.display()))?;
            }
        } else {
            good += 1;
        }
    }
    println!("Done, {changed} changed, {good} already good.");
    Ok(())
}

/// Expand directories into the `.json` files under them; missing paths are skipped.
fn json_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            out.extend(
                Target::All
                    .files(path)?
                    .into_iter()
                    .filter(|p| has_json_ext(p)),
            );
        } else if path.is_file() {
            out.push(path.clone());
        } else {
            tracing::debug!(path = %path.display(), "skipping missing path");
        }
    }
    Ok(out)
}

fn has_json_ext(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}
