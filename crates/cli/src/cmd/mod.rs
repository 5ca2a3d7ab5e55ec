mod build;
mod clean;
mod list;
mod status;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use list::cmd_list;
pub use status::cmd_status;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, warn};

use depkit_lib::build::CMakeRunner;
use depkit_lib::config::Config;
use depkit_lib::platform::paths;
use depkit_lib::process::RunContext;
use depkit_lib::toolkit::{TaskRun, Toolkit};
use depkit_lib::vcs::GitCheckout;

use crate::Selection;
use crate::output::{print_diagnostics, print_error};

pub type ManifestToolkit = Toolkit<GitCheckout, CMakeRunner>;

/// Load the manifest and build the toolkit it describes.
pub fn load(explicit: Option<&Path>) -> Result<(Config, ManifestToolkit)> {
  let path = paths::config_path(explicit);
  debug!(path = %path.display(), "loading manifest");
  let config = Config::load(&path).with_context(|| format!("Failed to load manifest {}", path.display()))?;
  let toolkit = Toolkit::from_config(&config);
  Ok((config, toolkit))
}

/// Names to run on; empty means every dependency.
pub fn selected_names(selection: &Selection) -> Result<&[String]> {
  if selection.all {
    return Ok(&[]);
  }
  if selection.deps.is_empty() {
    bail!("No dependencies given; name one or more, or pass --all");
  }
  Ok(&selection.deps)
}

/// Run `fut` on a fresh runtime, cancelling `ctx` on Ctrl-C.
pub fn block_on_interruptible<F, T>(ctx: &RunContext, fut: F) -> Result<T>
where
  F: Future<Output = T>,
{
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let cancel = ctx.cancel.clone();
  Ok(rt.block_on(async move {
    let watcher = tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, stopping running tools");
        cancel.cancel();
      }
    });
    let output = fut.await;
    watcher.abort();
    output
  }))
}

/// Timeout from the command line, else from settings. Zero disables it.
pub fn effective_timeout(flag: Option<Duration>, config: &Config) -> Option<Duration> {
  match flag {
    Some(timeout) if timeout.is_zero() => None,
    Some(timeout) => Some(timeout),
    None => config.settings.timeout(),
  }
}

/// JSON shape of one task run.
#[derive(Serialize)]
pub struct RunJson<'a, T: Serialize> {
  pub name: &'a str,
  pub ok: bool,
  pub elapsed_ms: u128,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub report: Option<&'a T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl<'a, T: Serialize> From<&'a TaskRun<T>> for RunJson<'a, T> {
  fn from(run: &'a TaskRun<T>) -> Self {
    Self {
      name: &run.name,
      ok: run.is_ok(),
      elapsed_ms: run.elapsed.as_millis(),
      report: run.result.as_ref().ok(),
      error: run.result.as_ref().err().map(|e| e.to_string()),
    }
  }
}

/// Print a failed task: the first line of the error, then tool output.
pub fn print_failure(name: &str, error: &dyn std::error::Error) {
  let message = error.to_string();
  let mut lines = message.lines();
  print_error(&format!("{}: {}", name, lines.next().unwrap_or_default()));
  let rest: Vec<&str> = lines.collect();
  if !rest.is_empty() {
    print_diagnostics(&rest.join("\n"));
  }
}

/// Turn failed runs into a non-zero exit.
pub fn check_runs<T>(runs: &[TaskRun<T>], verb: &str) -> Result<()> {
  let failed = runs.iter().filter(|run| !run.is_ok()).count();
  if failed > 0 {
    bail!("{} of {} dependencies failed to {}", failed, runs.len(), verb);
  }
  Ok(())
}
