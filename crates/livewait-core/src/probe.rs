//! Log-based liveness probe definition.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};

/// Default total time budget: 10 minutes.
pub const DEFAULT_BUDGET_MS: u64 = 600_000;

/// Default poll interval: 30 seconds.
pub const DEFAULT_INTERVAL_MS: u64 = 30_000;

/// Immutable description of a liveness probe.
///
/// The probe succeeds once `required_substring` shows up in the log
/// content fetched during a single poll interval, before
/// `total_budget_ms` is used up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeSpec {
    total_budget_ms: u64,
    interval_ms: u64,
    required_substring: String,
}

impl ProbeSpec {
    /// Probe with the default budget (10m) and interval (30s).
    pub fn new(required_substring: impl Into<String>) -> ConfigResult<Self> {
        Self::with_budget(DEFAULT_BUDGET_MS, DEFAULT_INTERVAL_MS, required_substring)
    }

    /// Probe with an explicit budget and interval, in milliseconds.
    pub fn with_budget(
        total_budget_ms: u64,
        interval_ms: u64,
        required_substring: impl Into<String>,
    ) -> ConfigResult<Self> {
        let required_substring = required_substring.into();
        if total_budget_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe budget must be greater than zero".to_string(),
            ));
        }
        if interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe interval must be greater than zero".to_string(),
            ));
        }
        if required_substring.is_empty() {
            return Err(ConfigError::Invalid(
                "probe log substring must not be empty".to_string(),
            ));
        }
        Ok(Self {
            total_budget_ms,
            interval_ms,
            required_substring,
        })
    }

    /// Same as [`ProbeSpec::with_budget`], taking durations.
    ///
    /// Sub-millisecond precision is dropped.
    pub fn from_durations(
        budget: Duration,
        interval: Duration,
        required_substring: impl Into<String>,
    ) -> ConfigResult<Self> {
        let to_ms = |d: Duration, what: &str| {
            u64::try_from(d.as_millis())
                .map_err(|_| ConfigError::Invalid(format!("probe {what} is too large")))
        };
        Self::with_budget(
            to_ms(budget, "budget")?,
            to_ms(interval, "interval")?,
            required_substring,
        )
    }

    /// Total time the probe may take, in milliseconds.
    pub fn total_budget_ms(&self) -> u64 {
        self.total_budget_ms
    }

    /// Time between polls, in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Time between polls.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Log text that marks the target as live.
    pub fn required_substring(&self) -> &str {
        &self.required_substring
    }

    /// Number of poll iterations a never-matching run performs.
    pub fn max_iterations(&self) -> u64 {
        self.total_budget_ms.div_ceil(self.interval_ms)
    }
}

impl fmt::Display for ProbeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "log contains {:?} (budget {}ms, interval {}ms)",
            self.required_substring, self.total_budget_ms, self.interval_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_only_uses_defaults() {
        let probe = ProbeSpec::new("ready").unwrap();
        assert_eq!(probe.total_budget_ms(), 600_000);
        assert_eq!(probe.interval_ms(), 30_000);
        assert_eq!(probe.required_substring(), "ready");
        assert_eq!(probe.max_iterations(), 20);
    }

    #[test]
    fn empty_substring_rejected() {
        assert!(matches!(ProbeSpec::new(""), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            ProbeSpec::with_budget(1_000, 100, ""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_budget_or_interval_rejected() {
        assert!(matches!(
            ProbeSpec::with_budget(0, 100, "ready"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ProbeSpec::with_budget(1_000, 0, "ready"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn iterations_round_up_for_uneven_interval() {
        let probe = ProbeSpec::with_budget(100_000, 30_000, "ready").unwrap();
        assert_eq!(probe.max_iterations(), 4);

        let probe = ProbeSpec::with_budget(90_000, 30_000, "ready").unwrap();
        assert_eq!(probe.max_iterations(), 3);

        // Interval longer than the budget still polls once.
        let probe = ProbeSpec::with_budget(1_000, 5_000, "ready").unwrap();
        assert_eq!(probe.max_iterations(), 1);
    }

    #[test]
    fn from_durations_converts_to_millis() {
        let probe = ProbeSpec::from_durations(
            Duration::from_secs(90),
            Duration::from_millis(1_500),
            "up",
        )
        .unwrap();
        assert_eq!(probe.total_budget_ms(), 90_000);
        assert_eq!(probe.interval(), Duration::from_millis(1_500));
    }

    #[test]
    fn from_durations_rejects_budgets_beyond_u64_millis() {
        let err = ProbeSpec::from_durations(Duration::MAX, Duration::from_secs(1), "up").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn display_names_substring_and_timing() {
        let probe = ProbeSpec::with_budget(90_000, 30_000, "ready").unwrap();
        assert_eq!(
            probe.to_string(),
            "log contains \"ready\" (budget 90000ms, interval 30000ms)"
        );
    }
}
