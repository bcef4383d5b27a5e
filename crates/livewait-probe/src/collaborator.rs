//! Contracts for the runtime client the poller drives.
//!
//! Implementations talk to whatever hosts the workload. Their errors are
//! never retried by the poller: any failure aborts the run.

use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;

use livewait_core::InspectionSnapshot;

/// Result type alias for collaborator calls.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Transport-level failures reported by a runtime client.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Reports whether a target is currently running.
pub trait RuntimeInspector: Send + Sync {
    fn inspect(&self, target: &str) -> impl Future<Output = RuntimeResult<InspectionSnapshot>> + Send;
}

/// Yields log text a target produced since a point in time.
pub trait LogTailSource: Send + Sync {
    /// Append up to `max_lines` of the target's log output since `since`
    /// to `into`. Appending nothing is a valid answer.
    fn fetch_since(
        &self,
        target: &str,
        since: SystemTime,
        max_lines: usize,
        into: &mut String,
    ) -> impl Future<Output = RuntimeResult<()>> + Send;
}

/// Log source for runs that only check the running state.
///
/// Every fetch succeeds and appends nothing, so a run with a probe
/// against it can only time out or see the target stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogs;

impl LogTailSource for NoLogs {
    async fn fetch_since(
        &self,
        _target: &str,
        _since: SystemTime,
        _max_lines: usize,
        _into: &mut String,
    ) -> RuntimeResult<()> {
        Ok(())
    }
}

impl<T: RuntimeInspector> RuntimeInspector for &T {
    fn inspect(&self, target: &str) -> impl Future<Output = RuntimeResult<InspectionSnapshot>> + Send {
        (**self).inspect(target)
    }
}

impl<T: RuntimeInspector> RuntimeInspector for Arc<T> {
    fn inspect(&self, target: &str) -> impl Future<Output = RuntimeResult<InspectionSnapshot>> + Send {
        (**self).inspect(target)
    }
}

impl<T: LogTailSource> LogTailSource for &T {
    fn fetch_since(
        &self,
        target: &str,
        since: SystemTime,
        max_lines: usize,
        into: &mut String,
    ) -> impl Future<Output = RuntimeResult<()>> + Send {
        (**self).fetch_since(target, since, max_lines, into)
    }
}

impl<T: LogTailSource> LogTailSource for Arc<T> {
    fn fetch_since(
        &self,
        target: &str,
        since: SystemTime,
        max_lines: usize,
        into: &mut String,
    ) -> impl Future<Output = RuntimeResult<()>> + Send {
        (**self).fetch_since(target, since, max_lines, into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_logs_appends_nothing() {
        let mut buf = String::from("earlier");
        NoLogs
            .fetch_since("api", SystemTime::now(), 10, &mut buf)
            .await
            .unwrap();
        assert_eq!(buf, "earlier");
    }
}
