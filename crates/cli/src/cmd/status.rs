//! Status command implementation.
//!
//! Reports, per dependency, whether it is checked out and built for the
//! requested build type. Only reads the filesystem.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use depkit_lib::build::BuildType;
use depkit_lib::task::TaskState;
use depkit_lib::toolkit::TaskStatus;

use super::{load, print_failure};
use crate::output::{OutputFormat, print_info, print_json, symbols, truncate_hash};

#[derive(Serialize)]
struct StatusJson<'a> {
  name: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  status: Option<&'a TaskStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

pub fn cmd_status(
  config: Option<&Path>,
  deps: &[String],
  build_type: Option<BuildType>,
  output: OutputFormat,
) -> Result<()> {
  let (config, toolkit) = load(config)?;
  let build_type = build_type.unwrap_or(config.settings.build_type);
  let tasks = toolkit.select(deps)?;
  let statuses = toolkit.status(&tasks, build_type);

  if output.is_json() {
    let entries: Vec<_> = statuses
      .iter()
      .map(|(name, status)| StatusJson {
        name,
        status: status.as_ref().ok(),
        error: status.as_ref().err().map(|e| e.to_string()),
      })
      .collect();
    print_json(&entries)?;
  } else if statuses.is_empty() {
    print_info("No dependencies configured");
  } else {
    for (name, status) in &statuses {
      match status {
        Ok(status) => print_status(name, status, build_type),
        Err(e) => print_failure(name, e),
      }
    }
  }

  let broken = statuses.iter().filter(|(_, status)| status.is_err()).count();
  if broken > 0 {
    bail!("{} of {} dependencies have unusable working trees", broken, statuses.len());
  }
  Ok(())
}

fn print_status(name: &str, status: &TaskStatus, build_type: BuildType) {
  let symbol = match status.state {
    TaskState::Built => symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    TaskState::CheckedOut => symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()).to_string(),
    TaskState::UncheckedOut => symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
  };
  let detail = match (&status.state, &status.tree.current_ref) {
    (TaskState::Built, Some(commit)) => format!("built ({build_type}) {} {}", symbols::ARROW, truncate_hash(commit)),
    (TaskState::CheckedOut, Some(commit)) => format!("checked out {} {}", symbols::ARROW, truncate_hash(commit)),
    (state, _) => state.to_string(),
  };
  println!("{symbol} {name}: {detail}");
}
