//! Dependency tasks.
//!
//! A [`DependencyTask`] binds one source locator and one set of option
//! overrides to a VCS capability and a build capability, and exposes the two
//! operations a toolkit user sees: `build` and `clean`.
//!
//! # States
//!
//! ```text
//! UncheckedOut --ensure--> CheckedOut --configure+compile--> Built
//!      ^                        ^                              |
//!      |                        +------------clean-------------+
//!  (tree removed externally)
//! ```
//!
//! There is no terminal state. Both operations can be repeated in any order.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::build::{
  BuildArtifactTree, BuildError, BuildOptionSet, BuildType, GlobalOptions, NativeBuildRunner, OptionOverrides,
  merge_options,
};
use crate::process::RunContext;
use crate::vcs::{SourceLocator, VcsCheckout, VcsError, WorkingTree};

/// Observed lifecycle state of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
  UncheckedOut,
  CheckedOut,
  Built,
}

impl std::fmt::Display for TaskState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TaskState::UncheckedOut => write!(f, "not checked out"),
      TaskState::CheckedOut => write!(f, "checked out"),
      TaskState::Built => write!(f, "built"),
    }
  }
}

/// Errors surfaced by a task operation.
#[derive(Debug, Error)]
pub enum TaskError {
  #[error(transparent)]
  Vcs(#[from] VcsError),

  #[error(transparent)]
  Build(#[from] BuildError),
}

/// Result of a successful `build`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub name: String,
  pub tree: WorkingTree,
  pub options: BuildOptionSet,
  pub artifacts: BuildArtifactTree,
}

/// Result of a successful `clean`.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
  pub name: String,
  pub tree: PathBuf,
  pub removed: Vec<PathBuf>,
}

/// Build and clean one third-party dependency.
#[derive(Debug, Clone)]
pub struct DependencyTask<V, B> {
  name: String,
  description: String,
  clean_description: String,
  locator: SourceLocator,
  overrides: OptionOverrides,
  vcs: V,
  runner: B,
}

impl<V: VcsCheckout, B: NativeBuildRunner> DependencyTask<V, B> {
  pub fn new(name: impl Into<String>, locator: SourceLocator, overrides: OptionOverrides, vcs: V, runner: B) -> Self {
    let name = name.into();
    Self {
      description: format!("build {name}"),
      clean_description: format!("clean built {name} libraries"),
      name,
      locator,
      overrides,
      vcs,
      runner,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_clean_description(mut self, description: impl Into<String>) -> Self {
    self.clean_description = description.into();
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// One-line description of the `build` operation.
  pub fn description(&self) -> &str {
    &self.description
  }

  /// One-line description of the `clean` operation.
  pub fn clean_description(&self) -> &str {
    &self.clean_description
  }

  pub fn locator(&self) -> &SourceLocator {
    &self.locator
  }

  pub fn overrides(&self) -> &OptionOverrides {
    &self.overrides
  }

  /// The option set a build of this type would use.
  pub fn options(&self, build_type: BuildType, defaults: &GlobalOptions) -> BuildOptionSet {
    merge_options(defaults.for_build_type(build_type), &self.overrides.resolve(build_type))
  }

  /// Directory the dependency is checked out into.
  pub fn tree_path(&self) -> PathBuf {
    self.vcs.tree_path(&self.locator)
  }

  /// The working tree as it is on disk right now.
  pub fn working_tree(&self) -> Result<WorkingTree, TaskError> {
    Ok(self.vcs.inspect(&self.locator)?)
  }

  /// Observe the current state without changing anything.
  ///
  /// `Built` means a build of the current commit with the options a `build`
  /// would use right now; after an option change the task is only checked out.
  pub fn state(&self, build_type: BuildType, defaults: &GlobalOptions) -> Result<TaskState, TaskError> {
    let tree = self.working_tree()?;
    Ok(self.state_of(&tree, build_type, defaults))
  }

  /// State of an already inspected working tree.
  pub fn state_of(&self, tree: &WorkingTree, build_type: BuildType, defaults: &GlobalOptions) -> TaskState {
    if !tree.exists || tree.current_ref.is_none() {
      TaskState::UncheckedOut
    } else if self.runner.is_built(tree, build_type, &self.options(build_type, defaults)) {
      TaskState::Built
    } else {
      TaskState::CheckedOut
    }
  }

  /// Check out the pinned ref, then configure and compile.
  ///
  /// Repeating a build with the same ref and options performs no clone, no
  /// fetch and no compile.
  pub async fn build(
    &self,
    build_type: BuildType,
    defaults: &GlobalOptions,
    ctx: &RunContext,
  ) -> Result<BuildReport, TaskError> {
    info!(name = %self.name, build_type = %build_type, "building dependency");

    let tree = self.vcs.ensure(&self.locator, ctx).await?;
    let options = self.options(build_type, defaults);
    let artifacts = self
      .runner
      .configure_and_compile(&tree, build_type, &options, ctx)
      .await?;

    Ok(BuildReport {
      name: self.name.clone(),
      tree,
      options,
      artifacts,
    })
  }

  /// Remove build output, keeping the checkout.
  ///
  /// Does not consult the VCS: a missing or broken checkout simply has
  /// nothing (or only its build directories) to remove.
  pub async fn clean(&self) -> Result<CleanReport, TaskError> {
    info!(name = %self.name, "cleaning dependency");

    let tree = WorkingTree::at(&self.vcs.tree_path(&self.locator));
    let outcome = self.runner.remove_artifacts(&tree).await?;

    Ok(CleanReport {
      name: self.name.clone(),
      tree: tree.path,
      removed: outcome.removed,
    })
  }
}
