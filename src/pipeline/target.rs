use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{VertexError, VertexResult};

/// Which input files a run covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// One specific puzzle file.
    Single(PathBuf),
    /// Every file under the data root.
    All,
    /// Files under the data root whose file name lies in `lo..=hi` (string order).
    Range(String, String),
}

impl Target {
    /// Build a target from positional CLI arguments: `<path>`, `all`, or `<lo> <hi>`.
    pub fn from_args(args: &[String]) -> VertexResult<Self> {
        match args {
            [one] if one == "all" => Ok(Self::All),
            [one] => Ok(Self::Single(PathBuf::from(one))),
            [lo, hi] => Ok(Self::Range(lo.clone(), hi.clone())),
            _ => Err(VertexError::validation(
                "target must be a file path, 'all', or a '<lo> <hi>' file name range",
            )),
        }
    }

    /// Resolve the target to an ordered file list.
    ///
    /// Directories are walked breadth-first with entries sorted by name.
    pub fn files(&self, data_root: &Path) -> VertexResult<Vec<PathBuf>> {
        match self {
            Self::Single(path) => {
                if !path.is_file() {
                    return Err(VertexError::validation(format!(
                        "input '{}' is not a file",
                        path.display()
                    )));
                }
                Ok(vec![path.clone()])
            }
            Self::All => walk_sorted(data_root, |_| true),
            Self::Range(lo, hi) => walk_sorted(data_root, |name| {
                lo.as_str() <= name && name <= hi.as_str()
            }),
        }
    }
}

fn walk_sorted(root: &Path, keep: impl Fn(&str) -> bool) -> VertexResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut dirs = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = dirs.pop_front() {
        let mut entries = std::fs::read_dir(&dir)
            .with_context(|| format!("read data dir '{}'", dir.display()))?
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("list data dir '{}'", dir.display()))?;
        entries.sort();
        for path in entries {
            if path.is_dir() {
                dirs.push_back(path);
            } else if keep(&file_name(&path)) {
                out.push(path);
            }
        }
    }
    Ok(out)
}

/// Final path component as a string (lossy).
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The `YYYY-MM-DD` stamp a puzzle file name starts with (its first 10 characters).
pub fn source_date(path: &Path) -> String {
    file_name(path).chars().take(10).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/target.rs"]
mod tests;
