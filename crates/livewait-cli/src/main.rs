use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::ProbeArgs;

#[derive(Parser)]
#[command(
    name = "livewait",
    about = "livewait — block until a workload is live",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to a livewait.toml; command-line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a docker container.
    ///
    /// Without --log-contains (or [probe].log_contains in the config) this
    /// only checks that the container is running right now.
    Docker {
        /// Container name or id
        container: String,
        #[command(flatten)]
        probe: ProbeArgs,
        /// Docker-compatible binary to invoke (default: docker)
        #[arg(long)]
        docker_binary: Option<String>,
    },
    /// Wait for a local process, identified by PID.
    Process {
        /// Process id
        pid: u32,
        /// Log file the process writes to (required with --log-contains)
        #[arg(long)]
        log_file: Option<PathBuf>,
        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("livewait=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Docker {
            container,
            probe,
            docker_binary,
        } => commands::docker::wait(&config, &container, &probe, docker_binary.as_deref()).await,
        Commands::Process {
            pid,
            log_file,
            probe,
        } => commands::process::wait(&config, pid, log_file.as_deref(), &probe).await,
    }
}
