use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize as _;

use crate::encode::ffmpeg::{EncodeOpts, daily_video_rel, encode_frames, ensure_parent_dir};
use crate::foundation::error::VertexResult;
use crate::pipeline::run::{PipelineOpts, render_frames};
use crate::pipeline::target::source_date;
use crate::puzzle::model::Puzzle;

/// One rendered day in the daily index.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DailyEntry {
    /// Source date, `YYYY-MM-DD`.
    pub at: String,
    pub theme: String,
    /// Video path relative to the output directory.
    pub video: String,
    /// Fields added by other tools; carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `daily.json`: rendered days keyed by date.
#[derive(Debug)]
pub struct DailyIndex {
    path: PathBuf,
    entries: BTreeMap<String, DailyEntry>,
}

impl DailyIndex {
    /// Load the index at `path`; a missing file is an empty index.
    pub fn load(path: impl Into<PathBuf>) -> VertexResult<Self> {
        let path = path.into();
        let entries = if path.is_file() {
            let s = std::fs::read_to_string(&path)
                .with_context(|| format!("read daily index '{}'", path.display()))?;
            serde_json::from_str(&s)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn contains(&self, at: &str) -> bool {
        self.entries.contains_key(at)
    }

    pub fn get(&self, at: &str) -> Option<&DailyEntry> {
        self.entries.get(at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, entry: DailyEntry) {
        self.entries.insert(entry.at.clone(), entry);
    }

    /// Rewrite the index file: sorted keys, four-space indent, trailing newline.
    pub fn save(&self) -> VertexResult<()> {
        ensure_parent_dir(&self.path)?;
        // Round-trip through `Value` so flattened extras sort together with the known fields.
        let value = serde_json::to_value(&self.entries)?;
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        value.serialize(&mut ser)?;
        buf.push(b'\n');

        let tmp = self.path.with_extension("json.partial");
        std::fs::write(&tmp, &buf)
            .with_context(|| format!("write daily index '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("move daily index into place at '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Counts from a daily batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DailyStats {
    pub rendered: usize,
    pub skipped: usize,
}

/// Render one video per source day that the index does not have yet.
///
/// Each day is encoded to `<output_dir>/YYYY/MM/<date>.mp4` and recorded in `index` right away,
/// so an interrupted batch resumes where it stopped. Cancellation is checked before each file.
#[tracing::instrument(skip_all, fields(files = files.len()))]
pub fn run_daily(
    files: &[PathBuf],
    output_dir: &Path,
    index: &mut DailyIndex,
    pipeline: &PipelineOpts,
    encode: &EncodeOpts,
) -> VertexResult<DailyStats> {
    let mut stats = DailyStats::default();
    for file in files {
        if pipeline.cancel.is_cancelled() {
            break;
        }
        let at = source_date(file);
        if index.contains(&at) {
            stats.skipped += 1;
            continue;
        }
        tracing::info!(day = %at, "creating daily video");

        let video = daily_video_rel(&at);
        let rendered = render_frames(std::slice::from_ref(file), pipeline)?;
        if rendered.files == 0 {
            tracing::info!(day = %at, "cancelled before rendering");
            break;
        }
        let opts = EncodeOpts {
            out_path: output_dir.join(&video),
            ..encode.clone()
        };
        encode_frames(&pipeline.frames_dir, &opts)?;

        let theme = Puzzle::from_path(file)?.theme().to_owned();
        index.insert(DailyEntry {
            at,
            theme,
            video,
            extra: serde_json::Map::new(),
        });
        index.save()?;
        stats.rendered += 1;
    }
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/daily.rs"]
mod tests;
