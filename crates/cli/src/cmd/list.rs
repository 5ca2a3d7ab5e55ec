//! Implementation of the `depkit list` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use super::load;
use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Serialize)]
struct DependencyJson<'a> {
  name: &'a str,
  description: &'a str,
  clean_description: &'a str,
  uri: &'a str,
  tag: &'a str,
  directory: String,
}

pub fn cmd_list(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let (_, toolkit) = load(config)?;

  if output.is_json() {
    let deps: Vec<_> = toolkit
      .tasks()
      .iter()
      .map(|task| DependencyJson {
        name: task.name(),
        description: task.description(),
        clean_description: task.clean_description(),
        uri: task.locator().repository_uri(),
        tag: task.locator().pinned_ref(),
        directory: task.tree_path().display().to_string(),
      })
      .collect();
    return print_json(&deps);
  }

  if toolkit.tasks().is_empty() {
    print_info("No dependencies configured");
    return Ok(());
  }

  for task in toolkit.tasks() {
    println!("{}", task.name().if_supports_color(Stream::Stdout, |s| s.bold()));
    print_stat("build", task.description());
    print_stat("clean", task.clean_description());
    print_stat(
      "source",
      &format!("{} @ {}", task.locator().repository_uri(), task.locator().pinned_ref()),
    );
    print_stat("directory", &task.tree_path().display().to_string());
  }

  Ok(())
}
