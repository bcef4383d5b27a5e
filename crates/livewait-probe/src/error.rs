//! Terminal failures of a liveness run.

use thiserror::Error;

use livewait_core::{ConfigError, InspectionSnapshot, ProbeSpec, TargetId};

use crate::collaborator::RuntimeError;
use crate::poller::Outcome;

/// Result type alias for liveness runs.
pub type LivenessResult<T> = Result<T, LivenessError>;

/// Why a liveness run did not succeed.
///
/// Every variant is terminal; the poller never retries internally.
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),

    #[error("failed to inspect {target}: {source}")]
    InspectionFailed {
        target: TargetId,
        #[source]
        source: RuntimeError,
        last_inspection: Option<InspectionSnapshot>,
    },

    #[error("failed to fetch logs of {target}: {source}")]
    LogFetchFailed {
        target: TargetId,
        #[source]
        source: RuntimeError,
        last_inspection: InspectionSnapshot,
    },

    #[error("{target} is not running (observed on poll {iteration})")]
    NotRunning {
        target: TargetId,
        snapshot: InspectionSnapshot,
        iteration: u64,
    },

    #[error("{target} did not become live after {iterations} polls: {probe}")]
    TimedOut {
        target: TargetId,
        probe: ProbeSpec,
        iterations: u64,
        last_inspection: Option<InspectionSnapshot>,
    },

    #[error("probe of {target} cancelled after {iterations} polls")]
    Cancelled {
        target: TargetId,
        iterations: u64,
        last_inspection: Option<InspectionSnapshot>,
    },
}

impl LivenessError {
    /// The most recent inspection made before the run failed.
    pub fn last_inspection(&self) -> Option<&InspectionSnapshot> {
        match self {
            LivenessError::InvalidConfiguration(_) => None,
            LivenessError::InspectionFailed {
                last_inspection, ..
            }
            | LivenessError::TimedOut {
                last_inspection, ..
            }
            | LivenessError::Cancelled {
                last_inspection, ..
            } => last_inspection.as_ref(),
            LivenessError::LogFetchFailed {
                last_inspection, ..
            } => Some(last_inspection),
            LivenessError::NotRunning { snapshot, .. } => Some(snapshot),
        }
    }

    /// Terminal poll outcome, for failures that are one.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            LivenessError::TimedOut { .. } => Some(Outcome::TimedOut),
            LivenessError::NotRunning { .. } => Some(Outcome::NotRunning),
            _ => None,
        }
    }
}
