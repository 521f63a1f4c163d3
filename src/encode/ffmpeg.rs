use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{VertexError, VertexResult};
use crate::pipeline::target::{Target, file_name};

/// Environment variable that overrides the encoder binary.
pub const ENCODER_ENV: &str = "VERTEX_ENCODER";

/// Encoder settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncodeProfile {
    /// The encoder's own defaults.
    #[default]
    Default,
    /// NVIDIA hardware H.264 at 4:4:4.
    Nvenc,
}

/// Options for turning a frames directory into one video.
#[derive(Clone, Debug)]
pub struct EncodeOpts {
    /// Encoder executable, `ffmpeg` unless overridden.
    pub binary: PathBuf,
    /// Input frame rate.
    pub fps: u32,
    pub profile: EncodeProfile,
    /// Output video path.
    pub out_path: PathBuf,
}

impl EncodeOpts {
    /// Options writing to `out_path`, honoring the `VERTEX_ENCODER` override.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        let binary = std::env::var_os(ENCODER_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        Self {
            binary,
            fps: 60,
            profile: EncodeProfile::Default,
            out_path: out_path.into(),
        }
    }
}

/// Arguments (after the binary) that encode `frames_dir/frame_%08d.png`.
pub fn encoder_args(frames_dir: &Path, opts: &EncodeOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-framerate"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(opts.fps.to_string().into());
    args.push("-i".into());
    args.push(frames_dir.join("frame_%08d.png").into_os_string());
    if opts.profile == EncodeProfile::Nvenc {
        args.extend(
            [
                "-c:v",
                "h264_nvenc",
                "-profile",
                "high444p",
                "-pixel_format",
                "yuv444p",
                "-preset",
                "default",
            ]
            .into_iter()
            .map(OsString::from),
        );
    }
    args.push(opts.out_path.clone().into_os_string());
    args
}

/// Run the encoder once over a complete frame sequence.
///
/// A non-zero exit is returned as [`VertexError::Encode`] carrying the encoder's exit status.
#[tracing::instrument(skip_all, fields(out = %opts.out_path.display()))]
pub fn encode_frames(frames_dir: &Path, opts: &EncodeOpts) -> VertexResult<()> {
    if opts.fps == 0 {
        return Err(VertexError::validation("fps must be non-zero"));
    }
    ensure_parent_dir(&opts.out_path)?;

    let args = encoder_args(frames_dir, opts);
    tracing::info!(
        "$ {} {}",
        opts.binary.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(&opts.binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            VertexError::encode(
                None,
                format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    opts.binary.display()
                ),
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VertexError::encode(
            output.status.code(),
            format!(
                "'{}' exited with {}: {}",
                opts.binary.display(),
                output.status,
                stderr.trim()
            ),
        ));
    }
    Ok(())
}

/// Default video path for a run over `target`, under `output_dir`.
///
/// A single file maps to `vertex_<file name>.mp4`, a range to `vertex_<lo>_<hi>.mp4`, and
/// everything to `vertex_all.mp4`.
pub fn output_path_for(target: &Target, output_dir: &Path) -> PathBuf {
    let stem = match target {
        Target::Single(path) => file_name(path),
        Target::All => "all".to_owned(),
        Target::Range(lo, hi) => format!("{lo}_{hi}"),
    };
    output_dir.join(format!("vertex_{stem}.mp4"))
}

/// Path of a single day's video relative to the output directory: `YYYY/MM/<date>.mp4`.
pub fn daily_video_rel(date: &str) -> String {
    let year: String = date.chars().take(4).collect();
    let month: String = date.chars().skip(5).take(2).collect();
    format!("{year}/{month}/{date}.mp4")
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> VertexResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `binary -version` runs successfully.
pub fn is_encoder_available(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
