//! `livewait process` — wait for a local process and its log file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, bail};

use livewait_core::LivewaitConfig;
use livewait_probe::NoLogs;
use livewait_runtime::{LogFileTail, ProcessInspector};

use super::ProbeArgs;

pub async fn wait(
    config: &LivewaitConfig,
    pid: u32,
    log_file: Option<&Path>,
    args: &ProbeArgs,
) -> anyhow::Result<ExitCode> {
    let (probe, _) = args.resolve(config)?;
    let target = pid.to_string();

    match (log_file, &probe) {
        (Some(path), _) => {
            // An explicit --since replays the file; otherwise only new lines count.
            let logs = if args.since.is_some() {
                LogFileTail::from_start(path)
            } else {
                LogFileTail::from_end(path)
                    .await
                    .with_context(|| format!("failed to open log file {}", path.display()))?
            };
            super::run(&target, ProcessInspector::new(), logs, args, config).await
        }
        (None, Some(probe)) => bail!(
            "--log-file is required to wait for {:?} in the logs of process {pid}",
            probe.required_substring()
        ),
        (None, None) => super::run(&target, ProcessInspector::new(), NoLogs, args, config).await,
    }
}
