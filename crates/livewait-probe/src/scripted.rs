//! Scripted collaborators for exercising a poller without a runtime.
//!
//! Each double answers from a fixed script and records how it was called,
//! so callers can assert on call counts, buffer sizes, and request
//! parameters after a run.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::SystemTime;

use livewait_core::InspectionSnapshot;

use crate::collaborator::{LogTailSource, RuntimeError, RuntimeInspector, RuntimeResult};
use crate::progress::ProgressSink;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Reply(T),
    Fail(String),
}

#[derive(Debug)]
struct Script<T> {
    steps: VecDeque<Step<T>>,
    /// Answer once the script runs out.
    fallback: Step<T>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Step<T> {
        self.steps.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Inspector that reports running states from a script.
#[derive(Debug)]
pub struct ScriptedInspector {
    script: Mutex<Script<bool>>,
    calls: Mutex<usize>,
}

impl ScriptedInspector {
    /// Reports the given states in order, then keeps repeating the last.
    pub fn states(states: impl IntoIterator<Item = bool>) -> Self {
        let steps: VecDeque<_> = states.into_iter().map(Step::Reply).collect();
        let fallback = steps.back().cloned().unwrap_or(Step::Reply(true));
        Self::from_steps(steps, fallback)
    }

    /// Reports running on every inspection.
    pub fn always_running() -> Self {
        Self::states([true])
    }

    /// Stops running on the `n`th inspection (1-indexed).
    pub fn stops_on(n: usize) -> Self {
        let mut states = vec![true; n.saturating_sub(1)];
        states.push(false);
        Self::states(states)
    }

    /// Fails with a transport error on the `n`th inspection (1-indexed).
    pub fn fails_on(n: usize, message: &str) -> Self {
        let mut steps: VecDeque<_> = (1..n).map(|_| Step::Reply(true)).collect();
        steps.push_back(Step::Fail(message.to_string()));
        Self::from_steps(steps, Step::Fail(message.to_string()))
    }

    fn from_steps(steps: VecDeque<Step<bool>>, fallback: Step<bool>) -> Self {
        Self {
            script: Mutex::new(Script { steps, fallback }),
            calls: Mutex::new(0),
        }
    }

    /// Number of `inspect` calls made so far.
    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

impl RuntimeInspector for ScriptedInspector {
    async fn inspect(&self, _target: &str) -> RuntimeResult<InspectionSnapshot> {
        *lock(&self.calls) += 1;
        match lock(&self.script).next() {
            Step::Reply(running) => Ok(InspectionSnapshot::now(running)),
            Step::Fail(message) => Err(RuntimeError::Other(message)),
        }
    }
}

/// Log source that appends scripted chunks.
#[derive(Debug)]
pub struct ScriptedLogTail {
    script: Mutex<Script<String>>,
    /// Accumulator length seen at the start of each fetch.
    buffer_lens: Mutex<Vec<usize>>,
    requests: Mutex<Vec<(SystemTime, usize)>>,
}

impl ScriptedLogTail {
    /// Appends the given chunks in order, then nothing.
    pub fn sequence<S: Into<String>>(chunks: impl IntoIterator<Item = S>) -> Self {
        let steps = chunks.into_iter().map(|c| Step::Reply(c.into())).collect();
        Self::from_steps(steps, Step::Reply(String::new()))
    }

    /// Appends the same chunk on every fetch.
    pub fn repeating(chunk: &str) -> Self {
        Self::from_steps(VecDeque::new(), Step::Reply(chunk.to_string()))
    }

    /// Replies from an explicit script; failures become transport errors.
    pub fn steps(steps: impl IntoIterator<Item = Step<String>>, fallback: Step<String>) -> Self {
        Self::from_steps(steps.into_iter().collect(), fallback)
    }

    fn from_steps(steps: VecDeque<Step<String>>, fallback: Step<String>) -> Self {
        Self {
            script: Mutex::new(Script { steps, fallback }),
            buffer_lens: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `fetch_since` calls made so far.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Accumulator length at the start of each fetch, in order.
    pub fn buffer_lens(&self) -> Vec<usize> {
        lock(&self.buffer_lens).clone()
    }

    /// `(since, max_lines)` of every fetch, in order.
    pub fn requests(&self) -> Vec<(SystemTime, usize)> {
        lock(&self.requests).clone()
    }
}

impl LogTailSource for ScriptedLogTail {
    async fn fetch_since(
        &self,
        _target: &str,
        since: SystemTime,
        max_lines: usize,
        into: &mut String,
    ) -> RuntimeResult<()> {
        lock(&self.buffer_lens).push(into.len());
        lock(&self.requests).push((since, max_lines));
        match lock(&self.script).next() {
            Step::Reply(chunk) => {
                into.push_str(&chunk);
                Ok(())
            }
            Step::Fail(message) => Err(RuntimeError::Other(message)),
        }
    }
}

/// A progress notification as recorded by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(String),
    Progress(String),
    Completed,
}

/// Progress sink that keeps every notification.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Create a sink with no recorded events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).clone()
    }

    /// Just the `progress` messages.
    pub fn updates(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn started(&self, description: &str) {
        lock(&self.events).push(ProgressEvent::Started(description.to_string()));
    }

    fn progress(&self, status: &str) {
        lock(&self.events).push(ProgressEvent::Progress(status.to_string()));
    }

    fn completed(&self) {
        lock(&self.events).push(ProgressEvent::Completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inspector_repeats_last_state() {
        let inspector = ScriptedInspector::states([true, false]);
        assert!(inspector.inspect("t").await.unwrap().running);
        assert!(!inspector.inspect("t").await.unwrap().running);
        assert!(!inspector.inspect("t").await.unwrap().running);
        assert_eq!(inspector.calls(), 3);
    }

    #[tokio::test]
    async fn inspector_fails_on_schedule() {
        let inspector = ScriptedInspector::fails_on(2, "socket closed");
        assert!(inspector.inspect("t").await.is_ok());
        let err = inspector.inspect("t").await.unwrap_err();
        assert_eq!(err.to_string(), "socket closed");
    }

    #[tokio::test]
    async fn log_tail_appends_then_runs_dry() {
        let logs = ScriptedLogTail::sequence(["one", "two"]);
        let mut buf = String::new();
        let since = SystemTime::now();
        logs.fetch_since("t", since, 10, &mut buf).await.unwrap();
        logs.fetch_since("t", since, 10, &mut buf).await.unwrap();
        logs.fetch_since("t", since, 10, &mut buf).await.unwrap();
        assert_eq!(buf, "onetwo");
        assert_eq!(logs.buffer_lens(), vec![0, 3, 6]);
        assert_eq!(logs.calls(), 3);
    }
}
