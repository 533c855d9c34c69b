use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Batch progress, reported after each slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceProgress {
    pub processed: usize,
    pub total: usize,
}

impl SliceProgress {
    /// Completion in percent. An empty batch is complete.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.processed as f64 / self.total as f64;
        ratio * 100.0
    }
}

/// Receives batch progress.
pub trait ProgressSink {
    fn on_progress(&mut self, progress: SliceProgress);
}

impl<F: FnMut(SliceProgress)> ProgressSink for F {
    fn on_progress(&mut self, progress: SliceProgress) {
        self(progress);
    }
}

/// A sink that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _progress: SliceProgress) {}
}

/// Cooperative cancellation flag, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
