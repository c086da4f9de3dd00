//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

/// Receiver of progress updates from long-running algorithms
pub trait ProgressMonitor: Send + Sync {
    /// Percentage in 0..=100, or -1 when progress cannot be estimated
    fn set_percent_completed(&self, percent: i32);

    /// Short description of the current stage
    fn set_status(&self, message: &str);
}

/// Progress monitor that ignores every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn set_percent_completed(&self, _percent: i32) {}

    fn set_status(&self, _message: &str) {}
}

/// Progress monitor writing to the log, once per whole percent
#[derive(Debug)]
pub struct LogProgress {
    last: AtomicI32,
}

impl LogProgress {
    pub fn new() -> Self {
        Self {
            last: AtomicI32::new(i32::MIN),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMonitor for LogProgress {
    fn set_percent_completed(&self, percent: i32) {
        let previous = self.last.swap(percent, Ordering::Relaxed);
        if previous == percent {
            return;
        }
        if percent < 0 {
            log::debug!("Progress: indeterminate");
        } else if percent % 10 == 0 {
            log::info!("Progress: {}%", percent);
        } else {
            log::debug!("Progress: {}%", percent);
        }
    }

    fn set_status(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Shared flag used to ask running algorithms to stop at the next safe point
#[derive(Debug, Default, Clone)]
pub struct HaltFlag(Arc<AtomicBool>);

impl HaltFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_flag_is_shared() {
        let flag = HaltFlag::new();
        let copy = flag.clone();
        assert!(!copy.is_requested());

        flag.request();
        assert!(copy.is_requested());
    }
}
