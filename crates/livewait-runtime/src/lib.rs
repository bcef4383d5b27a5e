//! livewait-runtime — runtime clients the liveness poller can drive.
//!
//! - **`docker`** — shells out to the docker CLI (`docker inspect`,
//!   `docker logs`); works with any CLI-compatible binary such as podman.
//! - **`process`** — local processes: running state from `/proc`, logs
//!   from a file the process writes to.

pub mod docker;
pub mod process;

pub use docker::DockerCli;
pub use process::{LogFileTail, ProcessInspector};
