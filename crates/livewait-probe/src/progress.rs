//! Progress notifications for long-running probes.

use tracing::info;

/// Receives start/progress/complete notifications from a probe run.
pub trait ProgressSink: Send + Sync {
    fn started(&self, description: &str);
    fn progress(&self, status: &str);
    fn completed(&self);
}

/// Renders progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn started(&self, description: &str) {
        info!("{description}");
    }

    fn progress(&self, status: &str) {
        info!("{status}");
    }

    fn completed(&self) {
        info!("liveness probe finished");
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn started(&self, _description: &str) {}
    fn progress(&self, _status: &str) {}
    fn completed(&self) {}
}

impl<T: ProgressSink> ProgressSink for &T {
    fn started(&self, description: &str) {
        (**self).started(description);
    }

    fn progress(&self, status: &str) {
        (**self).progress(status);
    }

    fn completed(&self) {
        (**self).completed();
    }
}
