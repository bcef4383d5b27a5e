//! `livewait docker` — wait for a container through the docker CLI.

use std::process::ExitCode;

use livewait_core::LivewaitConfig;
use livewait_runtime::DockerCli;

use super::ProbeArgs;

pub async fn wait(
    config: &LivewaitConfig,
    container: &str,
    args: &ProbeArgs,
    binary: Option<&str>,
) -> anyhow::Result<ExitCode> {
    let docker = DockerCli::new(binary.unwrap_or(config.docker_binary()));
    super::run(container, &docker, &docker, args, config).await
}
