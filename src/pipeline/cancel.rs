use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop request, polled once per input file.
///
/// Cancelling stops new files from being admitted; frames already queued still get written.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    sentinel: Option<PathBuf>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also reports cancelled while `path` exists.
    pub fn with_sentinel(path: impl Into<PathBuf>) -> Self {
        Self {
            flag: Arc::default(),
            sentinel: Some(path.into()),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        match &self.sentinel {
            Some(path) if path.exists() => {
                tracing::info!(sentinel = %path.display(), "stop requested via sentinel file");
                self.flag.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/cancel.rs"]
mod tests;
