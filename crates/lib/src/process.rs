//! Subprocess execution for external tools.
//!
//! Every VCS and build tool invocation goes through [`run`], which captures
//! output, enforces an optional timeout and honours a cancellation token.
//! Children are spawned with `kill_on_drop`, and on unix as the leader of
//! their own process group, so expiry or cancellation also terminates what
//! the tool started (make, ninja, compilers).

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::consts::DIAGNOSTIC_TAIL_LINES;

/// Per-invocation limits shared by all subprocesses of one toolkit run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
  /// Upper bound for a single subprocess. `None` waits indefinitely.
  pub timeout: Option<Duration>,
  /// Cancelling this token terminates any in-flight subprocess.
  pub cancel: CancellationToken,
}

impl RunContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }
}

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn path_arg(self, path: &Path) -> Self {
    self.arg(path.to_string_lossy().to_string())
  }

  pub fn current_dir(mut self, dir: &Path) -> Self {
    self.cwd = Some(dir.to_path_buf());
    self
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.is_empty() || arg.contains(char::is_whitespace) {
        write!(f, " '{}'", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Captured output of a successful subprocess.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
  pub stdout: String,
  pub stderr: String,
}

/// Errors raised while running a subprocess.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The program could not be started.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// Waiting for the program failed.
  #[error("failed to wait for '{command}': {source}")]
  Io {
    command: String,
    #[source]
    source: std::io::Error,
  },

  /// The program exited unsuccessfully.
  #[error("'{command}' failed with exit code {code:?}")]
  Failed {
    command: String,
    code: Option<i32>,
    diagnostics: String,
  },

  /// The program exceeded the configured timeout and was killed.
  #[error("'{command}' timed out after {}s", after.as_secs())]
  TimedOut { command: String, after: Duration },

  /// The program was killed because the run was cancelled.
  #[error("'{command}' was cancelled")]
  Cancelled { command: String },
}

impl ProcessError {
  /// Diagnostic text suitable for showing to the user.
  ///
  /// For failed commands this is the tail of the tool's own output, otherwise
  /// the error message itself.
  pub fn diagnostics(&self) -> String {
    match self {
      ProcessError::Failed { diagnostics, .. } if !diagnostics.is_empty() => diagnostics.clone(),
      other => other.to_string(),
    }
  }
}

/// Run an invocation to completion.
///
/// Returns the captured output when the process exits with status 0.
pub async fn run(invocation: &Invocation, ctx: &RunContext) -> Result<ProcessOutput, ProcessError> {
  let command_line = invocation.to_string();

  if ctx.cancel.is_cancelled() {
    return Err(ProcessError::Cancelled { command: command_line });
  }

  let mut command = Command::new(&invocation.program);
  command
    .args(&invocation.args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

  if let Some(cwd) = &invocation.cwd {
    command.current_dir(cwd);
  }

  #[cfg(unix)]
  command.process_group(0);

  debug!(command = %command_line, cwd = ?invocation.cwd, "spawning process");

  let child = command.spawn().map_err(|source| ProcessError::Spawn {
    program: invocation.program.clone(),
    source,
  })?;
  let pid = child.id();

  let output = tokio::select! {
    waited = with_timeout(child.wait_with_output(), ctx.timeout) => match waited {
      Some(result) => result.map_err(|source| ProcessError::Io {
        command: command_line.clone(),
        source,
      })?,
      None => {
        kill_process_group(pid);
        return Err(ProcessError::TimedOut {
          command: command_line,
          after: ctx.timeout.unwrap_or_default(),
        });
      }
    },
    _ = ctx.cancel.cancelled() => {
      kill_process_group(pid);
      return Err(ProcessError::Cancelled { command: command_line });
    }
  };

  let stdout = String::from_utf8_lossy(&output.stdout).to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).to_string();

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ProcessError::Failed {
      command: command_line,
      code: output.status.code(),
      diagnostics: diagnostics(&stdout, &stderr),
    });
  }

  Ok(ProcessOutput { stdout, stderr })
}

/// Kill every process left in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
  use rustix::process::{Pid, Signal};

  let Some(pgid) = pid.and_then(|pid| i32::try_from(pid).ok()).and_then(Pid::from_raw) else {
    return;
  };
  if let Err(e) = rustix::process::kill_process_group(pgid, Signal::KILL) {
    debug!(pgid = ?pgid, error = %e, "process group already gone");
  }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

async fn with_timeout<F: Future>(future: F, limit: Option<Duration>) -> Option<F::Output> {
  match limit {
    Some(limit) => tokio::time::timeout(limit, future).await.ok(),
    None => Some(future.await),
  }
}

/// Combine both output streams and keep the trailing lines.
fn diagnostics(stdout: &str, stderr: &str) -> String {
  let mut combined = String::new();
  for stream in [stdout.trim_end(), stderr.trim_end()] {
    if stream.is_empty() {
      continue;
    }
    if !combined.is_empty() {
      combined.push('\n');
    }
    combined.push_str(stream);
  }
  tail_lines(&combined, DIAGNOSTIC_TAIL_LINES)
}

fn tail_lines(text: &str, count: usize) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let start = lines.len().saturating_sub(count);
  lines[start..].join("\n")
}
