//! livewait.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::ConfigResult;
use crate::probe::{DEFAULT_BUDGET_MS, DEFAULT_INTERVAL_MS, ProbeSpec};

/// Default number of log lines requested per fetch.
pub const DEFAULT_TAIL_LINES: usize = 10;

/// Top-level `livewait.toml` configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivewaitConfig {
    pub probe: Option<ProbeConfig>,
    pub tail: Option<TailConfig>,
    pub docker: Option<DockerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Substring that marks the target as live.
    pub log_contains: Option<String>,
    /// Total time budget (e.g., "10m").
    pub budget: Option<String>,
    /// Poll interval (e.g., "30s").
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailConfig {
    pub max_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Path or name of the docker executable.
    pub binary: Option<String>,
}

impl LivewaitConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the probe described by `[probe]`, if it names a substring.
    ///
    /// Missing budget or interval fall back to the probe defaults.
    pub fn probe_spec(&self) -> ConfigResult<Option<ProbeSpec>> {
        let Some(probe) = &self.probe else {
            return Ok(None);
        };
        let Some(substring) = &probe.log_contains else {
            return Ok(None);
        };

        let budget = match &probe.budget {
            Some(s) => parse_duration(s)?,
            None => Duration::from_millis(DEFAULT_BUDGET_MS),
        };
        let interval = match &probe.interval {
            Some(s) => parse_duration(s)?,
            None => Duration::from_millis(DEFAULT_INTERVAL_MS),
        };

        ProbeSpec::from_durations(budget, interval, substring.clone()).map(Some)
    }

    /// Lines requested per log fetch, from `[tail]` or the default.
    pub fn tail_lines(&self) -> usize {
        self.tail
            .as_ref()
            .and_then(|t| t.max_lines)
            .unwrap_or(DEFAULT_TAIL_LINES)
    }

    /// Docker executable from `[docker]`, or `docker`.
    pub fn docker_binary(&self) -> &str {
        self.docker
            .as_ref()
            .and_then(|d| d.binary.as_deref())
            .unwrap_or("docker")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn empty_config_has_no_probe() {
        let config = LivewaitConfig::from_toml_str("").unwrap();
        assert!(config.probe_spec().unwrap().is_none());
        assert_eq!(config.tail_lines(), 10);
        assert_eq!(config.docker_binary(), "docker");
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
[probe]
log_contains = "listening on"
budget = "2m"
interval = "5s"

[tail]
max_lines = 50

[docker]
binary = "/usr/local/bin/podman"
"#;
        let config = LivewaitConfig::from_toml_str(toml_str).unwrap();
        let probe = config.probe_spec().unwrap().unwrap();
        assert_eq!(probe.total_budget_ms(), 120_000);
        assert_eq!(probe.interval_ms(), 5_000);
        assert_eq!(probe.required_substring(), "listening on");
        assert_eq!(config.tail_lines(), 50);
        assert_eq!(config.docker_binary(), "/usr/local/bin/podman");
    }

    #[test]
    fn probe_section_without_substring_is_no_probe() {
        let config = LivewaitConfig::from_toml_str("[probe]\nbudget = \"1m\"\n").unwrap();
        assert!(config.probe_spec().unwrap().is_none());
    }

    #[test]
    fn substring_only_uses_probe_defaults() {
        let config = LivewaitConfig::from_toml_str("[probe]\nlog_contains = \"ready\"\n").unwrap();
        let probe = config.probe_spec().unwrap().unwrap();
        assert_eq!(probe.total_budget_ms(), DEFAULT_BUDGET_MS);
        assert_eq!(probe.interval_ms(), DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn large_durations_keep_every_millisecond() {
        let config = LivewaitConfig::from_toml_str(
            "[probe]\nlog_contains = \"ready\"\nbudget = \"5124095576030h\"\ninterval = \"1500ms\"\n",
        )
        .unwrap();
        let probe = config.probe_spec().unwrap().unwrap();
        assert_eq!(probe.total_budget_ms(), 5_124_095_576_030 * 3_600_000);
        assert_eq!(probe.interval_ms(), 1_500);
    }

    #[test]
    fn zero_interval_is_invalid() {
        let config = LivewaitConfig::from_toml_str(
            "[probe]\nlog_contains = \"ready\"\ninterval = \"0s\"\n",
        )
        .unwrap();
        assert!(matches!(config.probe_spec(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_duration_is_reported() {
        let config = LivewaitConfig::from_toml_str(
            "[probe]\nlog_contains = \"ready\"\nbudget = \"forever\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.probe_spec(),
            Err(ConfigError::Duration { .. })
        ));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livewait.toml");
        std::fs::write(&path, "[tail]\nmax_lines = 3\n").unwrap();

        let config = LivewaitConfig::from_file(&path).unwrap();
        assert_eq!(config.tail_lines(), 3);
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LivewaitConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = LivewaitConfig::from_toml_str("[probe\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
