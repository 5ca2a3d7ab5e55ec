//! Implementation of the `depkit clean` command.
//!
//! Removes build output of the selected dependencies. Checkouts stay, so a
//! later `build` does not need to clone again.

use std::path::Path;

use anyhow::{Context, Result};

use depkit_lib::task::CleanReport;

use super::{RunJson, check_runs, load, print_failure, selected_names};
use crate::Selection;
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

pub fn cmd_clean(
  config: Option<&Path>,
  selection: &Selection,
  jobs: Option<usize>,
  output: OutputFormat,
) -> Result<()> {
  let (_, toolkit) = load(config)?;
  let toolkit = match jobs {
    Some(jobs) => toolkit.with_jobs(jobs),
    None => toolkit,
  };
  let tasks = toolkit.select(selected_names(selection)?)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let runs = rt.block_on(toolkit.clean(&tasks));

  if output.is_json() {
    let results: Vec<RunJson<'_, CleanReport>> = runs.iter().map(RunJson::from).collect();
    print_json(&results)?;
  } else {
    for run in &runs {
      match &run.result {
        Ok(report) if report.removed.is_empty() => print_info(&format!("{}: nothing to clean", report.name)),
        Ok(report) => {
          print_success(&format!("{}: removed build output", report.name));
          for path in &report.removed {
            print_stat("Removed", &path.display().to_string());
          }
        }
        Err(e) => print_failure(&run.name, e),
      }
    }
  }

  check_runs(&runs, "clean")
}
