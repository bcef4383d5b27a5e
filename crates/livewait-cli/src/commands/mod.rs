//! Subcommand implementations and the plumbing they share.

use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant, UNIX_EPOCH};

use anyhow::Context;
use clap::{Args, ValueEnum};
use tokio::sync::watch;
use tracing::info;

use livewait_core::config::ProbeConfig;
use livewait_core::{LivewaitConfig, ProbeSpec};
use livewait_probe::{
    LivenessError, LivenessPoller, LogTailSource, PollOptions, RunReport, RuntimeInspector,
    TracingProgress,
};

pub mod docker;
pub mod process;

/// Probe flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Substring that marks the workload as live
    #[arg(long)]
    pub log_contains: Option<String>,
    /// Total time budget, e.g. "10m" (default: 10m)
    #[arg(long)]
    pub budget: Option<String>,
    /// Poll interval, e.g. "30s" (default: 30s)
    #[arg(long)]
    pub interval: Option<String>,
    /// Log lines fetched per poll (default: 10)
    #[arg(long)]
    pub tail: Option<usize>,
    /// Only consider logs after this unix timestamp (default: now).
    /// With --log-file, any value reads the file from its start.
    #[arg(long)]
    pub since: Option<u64>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl ProbeArgs {
    /// Merge flags over `[probe]` / `[tail]` from the config file.
    pub fn resolve(&self, config: &LivewaitConfig) -> anyhow::Result<(Option<ProbeSpec>, PollOptions)> {
        let file = config.probe.clone().unwrap_or_default();
        let merged = LivewaitConfig {
            probe: Some(ProbeConfig {
                log_contains: self.log_contains.clone().or(file.log_contains),
                budget: self.budget.clone().or(file.budget),
                interval: self.interval.clone().or(file.interval),
            }),
            ..config.clone()
        };
        let probe = merged.probe_spec().context("invalid probe settings")?;

        let options = PollOptions {
            since: self.since.map(|secs| UNIX_EPOCH + Duration::from_secs(secs)),
            max_lines: self.tail.unwrap_or_else(|| config.tail_lines()),
        };
        Ok((probe, options))
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LivewaitConfig> {
    match path {
        Some(path) => LivewaitConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(LivewaitConfig::default()),
    }
}

/// Run one liveness check and report it; Ctrl-C cancels the wait.
pub async fn run<I, L>(
    target: &str,
    inspector: I,
    logs: L,
    args: &ProbeArgs,
    config: &LivewaitConfig,
) -> anyhow::Result<ExitCode>
where
    I: RuntimeInspector,
    L: LogTailSource,
{
    let (probe, options) = args.resolve(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping");
            let _ = shutdown_tx.send(true);
        }
    });

    let poller = LivenessPoller::new(inspector, logs, TracingProgress)
        .with_options(options)
        .with_shutdown(shutdown_rx);

    let started = Instant::now();
    let result = poller.run(target, probe.as_ref()).await;
    let elapsed = started.elapsed();

    report(&result, args.format, elapsed)?;
    Ok(ExitCode::from(exit_code(&result)))
}

fn report(
    result: &Result<RunReport, LivenessError>,
    format: OutputFormat,
    elapsed: Duration,
) -> anyhow::Result<()> {
    match (format, result) {
        (OutputFormat::Json, Ok(report)) => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        (OutputFormat::Json, Err(e)) => {
            let value = serde_json::json!({
                "outcome": e.outcome(),
                "error": e.to_string(),
                "last_inspection": e.last_inspection(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (OutputFormat::Text, Ok(report)) if report.iterations == 0 => {
            println!("✓ {} is running", report.target);
        }
        (OutputFormat::Text, Ok(report)) => {
            println!(
                "✓ {} is live (poll {}, {:.1}s)",
                report.target,
                report.iterations,
                elapsed.as_secs_f64()
            );
        }
        (OutputFormat::Text, Err(e)) => {
            eprintln!("✗ {e}");
        }
    }
    Ok(())
}

/// Process exit status for a run result.
pub fn exit_code(result: &Result<RunReport, LivenessError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(LivenessError::TimedOut { .. }) => 2,
        Err(LivenessError::NotRunning { .. }) => 3,
        Err(LivenessError::Cancelled { .. }) => 4,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livewait_core::InspectionSnapshot;
    use livewait_probe::{Outcome, RuntimeError};

    fn snapshot(running: bool) -> InspectionSnapshot {
        InspectionSnapshot {
            running,
            observed_at: 1,
        }
    }

    #[test]
    fn flags_override_config() {
        let config = LivewaitConfig::from_toml_str(
            "[probe]\nlog_contains = \"ready\"\nbudget = \"5m\"\ninterval = \"10s\"\n[tail]\nmax_lines = 40\n",
        )
        .unwrap();
        let args = ProbeArgs {
            interval: Some("1s".to_string()),
            tail: Some(5),
            since: Some(1_700_000_000),
            ..Default::default()
        };

        let (probe, options) = args.resolve(&config).unwrap();
        let probe = probe.unwrap();
        assert_eq!(probe.required_substring(), "ready");
        assert_eq!(probe.total_budget_ms(), 300_000);
        assert_eq!(probe.interval_ms(), 1_000);
        assert_eq!(options.max_lines, 5);
        assert_eq!(
            options.since,
            Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
        );
    }

    #[test]
    fn config_fills_missing_flags() {
        let config = LivewaitConfig::from_toml_str("[tail]\nmax_lines = 40\n").unwrap();
        let args = ProbeArgs {
            log_contains: Some("up".to_string()),
            ..Default::default()
        };

        let (probe, options) = args.resolve(&config).unwrap();
        let probe = probe.unwrap();
        assert_eq!(probe.total_budget_ms(), 600_000);
        assert_eq!(probe.interval_ms(), 30_000);
        assert_eq!(options.max_lines, 40);
        assert!(options.since.is_none());
    }

    #[test]
    fn no_substring_means_running_check() {
        let args = ProbeArgs {
            budget: Some("1m".to_string()),
            ..Default::default()
        };
        let (probe, _) = args.resolve(&LivewaitConfig::default()).unwrap();
        assert!(probe.is_none());
    }

    #[test]
    fn invalid_probe_flags_are_errors() {
        let args = ProbeArgs {
            log_contains: Some("ready".to_string()),
            interval: Some("0s".to_string()),
            ..Default::default()
        };
        assert!(args.resolve(&LivewaitConfig::default()).is_err());
    }

    #[test]
    fn load_config_without_path_is_default() {
        let config = load_config(None).unwrap();
        assert!(config.probe.is_none());
    }

    #[test]
    fn load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn exit_codes_distinguish_failures() {
        let ok: Result<RunReport, LivenessError> = Ok(RunReport {
            target: "t".to_string(),
            outcome: Outcome::MatchFound,
            iterations: 1,
            last_inspection: snapshot(true),
        });
        assert_eq!(exit_code(&ok), 0);

        let timed_out = Err(LivenessError::TimedOut {
            target: "t".to_string(),
            probe: ProbeSpec::new("ready").unwrap(),
            iterations: 20,
            last_inspection: Some(snapshot(true)),
        });
        assert_eq!(exit_code(&timed_out), 2);

        let not_running = Err(LivenessError::NotRunning {
            target: "t".to_string(),
            snapshot: snapshot(false),
            iteration: 1,
        });
        assert_eq!(exit_code(&not_running), 3);

        let cancelled = Err(LivenessError::Cancelled {
            target: "t".to_string(),
            iterations: 1,
            last_inspection: None,
        });
        assert_eq!(exit_code(&cancelled), 4);

        let failed = Err(LivenessError::InspectionFailed {
            target: "t".to_string(),
            source: RuntimeError::Other("boom".to_string()),
            last_inspection: None,
        });
        assert_eq!(exit_code(&failed), 1);
    }
}
