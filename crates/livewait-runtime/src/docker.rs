//! Docker CLI runtime client.
//!
//! Runs `docker inspect` for the running state and `docker logs` for log
//! output. The binary is configurable so podman or a wrapper script can
//! stand in for docker.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::process::Command;
use tracing::debug;

use livewait_core::InspectionSnapshot;
use livewait_probe::{LogTailSource, RuntimeError, RuntimeInspector, RuntimeResult};

/// Talks to containers through the docker command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    /// Create a client that runs `binary` for every command.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The docker-compatible executable this client runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn exec(&self, args: &[&str]) -> RuntimeResult<Output> {
        let command = self.describe(args);
        debug!(%command, "running docker command");

        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn describe(&self, args: &[&str]) -> String {
        let mut command = self.binary.display().to_string();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}

impl RuntimeInspector for DockerCli {
    async fn inspect(&self, target: &str) -> RuntimeResult<InspectionSnapshot> {
        let args = ["inspect", "--format", "{{.State.Running}}", target];
        let output = self.exec(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match stdout.trim() {
            "true" => Ok(InspectionSnapshot::now(true)),
            "false" => Ok(InspectionSnapshot::now(false)),
            other => Err(RuntimeError::UnexpectedOutput {
                command: self.describe(&args),
                output: other.to_string(),
            }),
        }
    }
}

impl LogTailSource for DockerCli {
    async fn fetch_since(
        &self,
        target: &str,
        since: SystemTime,
        max_lines: usize,
        into: &mut String,
    ) -> RuntimeResult<()> {
        let since = since
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string();
        let tail = max_lines.to_string();
        let output = self
            .exec(&["logs", "--since", since.as_str(), "--tail", tail.as_str(), target])
            .await?;

        // The container's stdout and stderr arrive on the matching streams.
        into.push_str(&String::from_utf8_lossy(&output.stdout));
        into.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(())
    }
}
