//! livewait-probe — decides whether a running workload has become live.
//!
//! A [`LivenessPoller`] repeatedly inspects a target's running state and
//! pulls the log output it produced since the run started, until the
//! probe's marker substring shows up, the time budget runs out, or the
//! target stops running.
//!
//! # Architecture
//!
//! ```text
//! LivenessPoller::run(target, probe?)
//!   ├── no probe: one RuntimeInspector::inspect → RunReport | NotRunning
//!   └── probe:    ProgressSink::started
//!       ├── loop while budget remains
//!       │   ├── RuntimeInspector::inspect  (not running → NotRunning)
//!       │   ├── LogTailSource::fetch_since → accumulator
//!       │   ├── accumulator contains marker → MatchFound
//!       │   └── progress, clear accumulator, sleep interval (cancellable)
//!       ├── budget exhausted → TimedOut
//!       └── ProgressSink::completed
//! ```
//!
//! The collaborators are traits so that any runtime client (docker CLI,
//! local processes, test doubles in [`scripted`]) can drive the loop.

pub mod collaborator;
pub mod error;
pub mod poller;
pub mod progress;
pub mod scripted;

pub use collaborator::{LogTailSource, NoLogs, RuntimeError, RuntimeInspector, RuntimeResult};
pub use error::{LivenessError, LivenessResult};
pub use poller::{LivenessPoller, Outcome, PollOptions, RunReport};
pub use progress::{NoProgress, ProgressSink, TracingProgress};
