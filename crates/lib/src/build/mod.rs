//! Native builds.
//!
//! A [`NativeBuildRunner`] configures and compiles a working tree with an
//! existing build tool, and removes what it generated. Runners only ever
//! write below their build directories; sources are never modified.

pub mod cmake;
pub mod marker;
pub mod options;
mod types;

use std::path::PathBuf;

use crate::process::RunContext;
use crate::vcs::WorkingTree;

pub use cmake::CMakeRunner;
pub use options::{BuildOptionSet, GlobalOptions, OptionOverrides, OptionValue, merge_options};
pub use types::{BuildArtifactTree, BuildError, BuildOutcome, BuildPhase, BuildType, CleanOutcome};

/// Capability to build and clean a working tree.
#[allow(async_fn_in_trait)]
pub trait NativeBuildRunner {
  /// Directory holding the generated output for one build type.
  fn build_dir(&self, tree: &WorkingTree, build_type: BuildType) -> PathBuf;

  /// Whether a complete build of the tree's current sources with exactly
  /// these options exists.
  fn is_built(&self, tree: &WorkingTree, build_type: BuildType, options: &BuildOptionSet) -> bool;

  /// Configure (when needed) and compile.
  ///
  /// Safe to call over partial or complete prior output. Changed options
  /// always cause a reconfigure; unchanged inputs make this a no-op.
  async fn configure_and_compile(
    &self,
    tree: &WorkingTree,
    build_type: BuildType,
    options: &BuildOptionSet,
    ctx: &RunContext,
  ) -> Result<BuildArtifactTree, BuildError>;

  /// Delete all generated output, leaving sources alone.
  ///
  /// Succeeds without doing anything when there is no output.
  async fn remove_artifacts(&self, tree: &WorkingTree) -> Result<CleanOutcome, BuildError>;
}
