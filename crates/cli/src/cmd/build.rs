//! Implementation of the `depkit build` command.
//!
//! Checks out each selected dependency at its pinned ref and configures and
//! compiles it. Dependencies run concurrently up to `--jobs`; a failure in
//! one does not stop the others.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use depkit_lib::build::{BuildOutcome, BuildType};
use depkit_lib::process::RunContext;
use depkit_lib::task::BuildReport;

use super::{RunJson, block_on_interruptible, check_runs, effective_timeout, load, print_failure, selected_names};
use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_success, truncate_hash};
use crate::{RunArgs, Selection};

#[derive(Serialize)]
struct BuildJson<'a> {
  build_type: BuildType,
  results: Vec<RunJson<'a, BuildReport>>,
}

pub fn cmd_build(config: Option<&Path>, selection: &Selection, args: &RunArgs, output: OutputFormat) -> Result<()> {
  let (config, toolkit) = load(config)?;
  let toolkit = match args.jobs {
    Some(jobs) => toolkit.with_jobs(jobs),
    None => toolkit,
  };
  let tasks = toolkit.select(selected_names(selection)?)?;
  let build_type = args.build_type.unwrap_or(config.settings.build_type);

  if tasks.is_empty() {
    print_info("No dependencies configured");
    return Ok(());
  }

  let ctx = RunContext::new().with_timeout(effective_timeout(args.timeout, &config));
  let runs = block_on_interruptible(&ctx, toolkit.build(&tasks, build_type, &ctx))?;

  if output.is_json() {
    print_json(&BuildJson {
      build_type,
      results: runs.iter().map(RunJson::from).collect(),
    })?;
  } else {
    for run in &runs {
      match &run.result {
        Ok(report) => print_report(report, build_type, &format_duration(run.elapsed)),
        Err(e) => print_failure(&run.name, e),
      }
    }
  }

  check_runs(&runs, "build")
}

fn print_report(report: &BuildReport, build_type: BuildType, elapsed: &str) {
  let what = match report.artifacts.outcome {
    BuildOutcome::UpToDate => {
      print_success(&format!("{} ({build_type}) is up to date", report.name));
      return;
    }
    BuildOutcome::Reconfigured => "configured and built",
    BuildOutcome::Recompiled => "rebuilt",
  };

  print_success(&format!("{} ({build_type}) {what} in {elapsed}", report.name));
  if let Some(commit) = &report.tree.current_ref {
    print_stat("Commit", truncate_hash(commit));
  }
  print_stat("Output", &report.artifacts.path.display().to_string());
}
