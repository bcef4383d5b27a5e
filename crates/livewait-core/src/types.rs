//! Shared types used across livewait crates.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Opaque identifier of the workload being probed (container name/id, PID).
pub type TargetId = String;

/// Point-in-time observation of whether a target is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSnapshot {
    pub running: bool,
    /// Unix timestamp (milliseconds) of the observation.
    pub observed_at: u64,
}

impl InspectionSnapshot {
    /// Snapshot observed now.
    pub fn now(running: bool) -> Self {
        Self {
            running,
            observed_at: epoch_millis(SystemTime::now()),
        }
    }
}

/// Milliseconds since the Unix epoch, saturating at zero for earlier times.
pub fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
