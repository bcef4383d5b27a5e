//! livewait-core — shared types for livewait.
//!
//! Holds the immutable [`ProbeSpec`] that describes a log-based liveness
//! probe, the [`InspectionSnapshot`] produced by runtime inspections,
//! duration-string parsing, and the `livewait.toml` configuration file.

pub mod config;
pub mod duration;
pub mod error;
pub mod probe;
pub mod types;

pub use config::LivewaitConfig;
pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
pub use probe::ProbeSpec;
pub use types::*;
