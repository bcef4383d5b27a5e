//! Local process runtime client.
//!
//! [`ProcessInspector`] treats the target as a PID and reads its state
//! from procfs. [`LogFileTail`] follows the log file the process writes.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;
use tracing::debug;

use livewait_core::InspectionSnapshot;
use livewait_probe::{LogTailSource, RuntimeError, RuntimeInspector, RuntimeResult};

/// Reports whether a local PID is alive, from `/proc/<pid>/stat`.
#[derive(Debug, Clone)]
pub struct ProcessInspector {
    proc_root: PathBuf,
}

impl Default for ProcessInspector {
    fn default() -> Self {
        Self::with_proc_root("/proc")
    }
}

impl ProcessInspector {
    /// Create an inspector that reads `/proc`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read process state below `proc_root` instead of `/proc`.
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl RuntimeInspector for ProcessInspector {
    async fn inspect(&self, target: &str) -> RuntimeResult<InspectionSnapshot> {
        let pid: u32 = target.trim().parse().map_err(|_| RuntimeError::InvalidTarget {
            target: target.to_string(),
            reason: "expected a numeric process id".to_string(),
        })?;

        let stat_path = self.proc_root.join(pid.to_string()).join("stat");
        let stat = match tokio::fs::read_to_string(&stat_path).await {
            Ok(stat) => stat,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(pid, "process not found");
                return Ok(InspectionSnapshot::now(false));
            }
            Err(e) => return Err(e.into()),
        };

        let state = process_state(&stat).ok_or_else(|| RuntimeError::UnexpectedOutput {
            command: format!("read {}", stat_path.display()),
            output: stat.trim().to_string(),
        })?;
        debug!(pid, %state, "process state");

        // Zombie and dead processes have exited.
        Ok(InspectionSnapshot::now(!matches!(state, 'Z' | 'X' | 'x')))
    }
}

/// State letter from a `/proc/<pid>/stat` line.
///
/// The command name is parenthesised and may itself contain spaces or
/// parentheses, so the state is read after the last `)`.
fn process_state(stat: &str) -> Option<char> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.trim_start().chars().next()
}

/// Follows a log file, returning complete lines appended since the last fetch.
///
/// A trailing line without its `\n` is left in place and returned whole
/// by a later fetch. The read position is kept between fetches, so use
/// one tail per run.
#[derive(Debug)]
pub struct LogFileTail {
    path: PathBuf,
    offset: Mutex<u64>,
}

impl LogFileTail {
    /// Create a tail whose first fetch returns the file's existing content.
    pub fn from_start(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: Mutex::new(0),
        }
    }

    /// Create a tail positioned at the current end of the file.
    ///
    /// Only lines written after this call are returned. A file that does
    /// not exist yet is read from its beginning once it appears.
    pub async fn from_end(path: impl Into<PathBuf>) -> RuntimeResult<Self> {
        let path = path.into();
        let len = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), offset = len, "log tail starts at end of file");
        Ok(Self {
            path,
            offset: Mutex::new(len),
        })
    }

    /// Path of the followed file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogTailSource for LogFileTail {
    /// A plain file carries no timestamps: the start point is the position
    /// chosen when the tail was created, and `since` is not consulted.
    async fn fetch_since(
        &self,
        _target: &str,
        _since: SystemTime,
        max_lines: usize,
        into: &mut String,
    ) -> RuntimeResult<()> {
        let mut offset = self.offset.lock().await;

        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "log file does not exist yet");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if *offset > len {
            debug!(path = %self.path.display(), "log file truncated, reading from start");
            *offset = 0;
        }
        if *offset == len {
            return Ok(());
        }

        let mut bytes = Vec::new();
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(*offset)).await?;
        file.take(len - *offset).read_to_end(&mut bytes).await?;

        // Stop after the last complete line; the rest is re-read next time.
        let complete = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        bytes.truncate(complete);
        *offset += complete as u64;

        let text = String::from_utf8_lossy(&bytes);
        into.push_str(last_lines(&text, max_lines));
        Ok(())
    }
}

/// The last `max_lines` lines of `text`, trailing newline kept.
fn last_lines(text: &str, max_lines: usize) -> &str {
    if max_lines == 0 {
        return "";
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    match body.rmatch_indices('\n').nth(max_lines - 1) {
        Some((i, _)) => &text[i + 1..],
        None => text,
    }
}
