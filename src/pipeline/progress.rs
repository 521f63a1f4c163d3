use std::time::{Duration, Instant};

/// Rate-limited status reporter: at most one line per `interval`.
#[derive(Debug)]
pub struct Progress {
    interval: Duration,
    next: Instant,
    suppressed: u64,
}

impl Progress {
    pub fn new(interval: Duration) -> Self {
        Self::new_at(interval, Instant::now())
    }

    /// A reporter whose first line may be logged at `start`.
    pub(crate) fn new_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            next: start,
            suppressed: 0,
        }
    }

    /// Log `msg()` if the interval has elapsed; returns whether it was logged.
    pub fn report(&mut self, msg: impl FnOnce() -> String) -> bool {
        self.report_at(Instant::now(), msg)
    }

    pub(crate) fn report_at(&mut self, now: Instant, msg: impl FnOnce() -> String) -> bool {
        if now < self.next {
            self.suppressed += 1;
            return false;
        }
        while self.next <= now {
            self.next += self.interval.max(Duration::from_millis(1));
        }
        tracing::info!(skipped = self.suppressed, "{}", msg());
        self.suppressed = 0;
        true
    }
}

/// Status line for one finished frame job.
pub fn status_line(file: &str, frame_file: &str, shapes_left: usize, files_left: usize) -> String {
    format!("done with {file}:{frame_file}, {shapes_left} shapes to show, {files_left} files left")
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
