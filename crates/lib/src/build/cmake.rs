//! CMake-backed builds.
//!
//! Each build type gets its own directory inside the working tree
//! (`build-debug`, `build-release`). The configure invocation is hashed and
//! recorded in markers so that unchanged builds are skipped and changed
//! options always reconfigure.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::build::marker::{BuildMarker, ConfigureMarker, read_marker, remove_marker, write_marker};
use crate::build::{
  BuildArtifactTree, BuildError, BuildOptionSet, BuildOutcome, BuildPhase, BuildType, CleanOutcome, NativeBuildRunner,
  OptionValue,
};
use crate::consts::{BUILD_COMPLETE_MARKER, BUILD_DIR_PREFIX, CONFIGURE_MARKER};
use crate::process::{self, Invocation, ProcessError, RunContext};
use crate::util::hash::hash_invocation;
use crate::vcs::WorkingTree;

const CMAKE_CACHE: &str = "CMakeCache.txt";

/// Runs `cmake` to configure and compile a working tree.
#[derive(Debug, Clone)]
pub struct CMakeRunner {
  program: String,
  generator: Option<String>,
  compile_jobs: Option<usize>,
}

impl Default for CMakeRunner {
  fn default() -> Self {
    Self {
      program: "cmake".to_string(),
      generator: None,
      compile_jobs: None,
    }
  }
}

impl CMakeRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Use a specific cmake executable instead of the one on `PATH`.
  pub fn with_program(mut self, program: impl Into<String>) -> Self {
    self.program = program.into();
    self
  }

  /// Generator passed as `-G`.
  pub fn with_generator(mut self, generator: Option<String>) -> Self {
    self.generator = generator;
    self
  }

  /// Parallelism passed to `cmake --build --parallel`.
  pub fn with_compile_jobs(mut self, jobs: Option<usize>) -> Self {
    self.compile_jobs = jobs;
    self
  }

  fn configure_invocation(&self, source: &Path, build_dir: &Path, flags: &[String]) -> Invocation {
    let mut invocation = Invocation::new(&self.program)
      .arg("-S")
      .path_arg(source)
      .arg("-B")
      .path_arg(build_dir);
    if let Some(generator) = &self.generator {
      invocation = invocation.arg("-G").arg(generator);
    }
    invocation.args(flags.iter().cloned())
  }

  fn compile_invocation(&self, build_dir: &Path, build_type: BuildType) -> Invocation {
    let invocation = Invocation::new(&self.program)
      .arg("--build")
      .path_arg(build_dir)
      .arg("--config")
      .arg(build_type.cmake_name());
    match self.compile_jobs {
      Some(jobs) => invocation.arg("--parallel").arg(jobs.to_string()),
      None => invocation,
    }
  }

  /// Hash identifying one configuration of `build_dir`.
  fn flags_hash(&self, tree: &WorkingTree, build_dir: &Path, flags: &[String]) -> String {
    hash_invocation(&self.configure_invocation(&tree.path, build_dir, flags).args).0
  }

  async fn configure(
    &self,
    tree: &WorkingTree,
    build_dir: &Path,
    flags: &[String],
    flags_hash: &str,
    ctx: &RunContext,
  ) -> Result<(), BuildError> {
    fs::create_dir_all(build_dir).await.map_err(|source| BuildError::Io {
      path: build_dir.to_path_buf(),
      source,
    })?;

    // A cache from a different (or interrupted) configuration would keep
    // options that are no longer requested.
    let cache = build_dir.join(CMAKE_CACHE);
    if cache.exists() {
      info!(path = %cache.display(), "discarding stale configuration");
      fs::remove_file(&cache).await.map_err(|source| BuildError::Io {
        path: cache.clone(),
        source,
      })?;
    }
    remove_marker(&build_dir.join(CONFIGURE_MARKER)).await?;

    let invocation = self.configure_invocation(&tree.path, build_dir, flags);
    info!(command = %invocation, "configuring");
    process::run(&invocation, ctx)
      .await
      .map_err(|e| phase_error(BuildPhase::Configure, e))?;

    write_marker(
      &build_dir.join(CONFIGURE_MARKER),
      &ConfigureMarker::new(flags_hash.to_string(), flags.to_vec()),
    )
    .await
  }

  async fn compile(&self, build_dir: &Path, build_type: BuildType, ctx: &RunContext) -> Result<(), BuildError> {
    let invocation = self.compile_invocation(build_dir, build_type);
    info!(command = %invocation, "compiling");
    process::run(&invocation, ctx)
      .await
      .map_err(|e| phase_error(BuildPhase::Compile, e))?;
    Ok(())
  }
}

impl NativeBuildRunner for CMakeRunner {
  fn build_dir(&self, tree: &WorkingTree, build_type: BuildType) -> PathBuf {
    tree.path.join(format!("{BUILD_DIR_PREFIX}{build_type}"))
  }

  fn is_built(&self, tree: &WorkingTree, build_type: BuildType, options: &BuildOptionSet) -> bool {
    let build_dir = self.build_dir(tree, build_type);
    let flags_hash = self.flags_hash(tree, &build_dir, &translate_options(options));
    read_marker::<BuildMarker>(&build_dir.join(BUILD_COMPLETE_MARKER))
      .is_some_and(|marker| marker.matches(&flags_hash, tree.current_ref.as_deref()))
  }

  async fn configure_and_compile(
    &self,
    tree: &WorkingTree,
    build_type: BuildType,
    options: &BuildOptionSet,
    ctx: &RunContext,
  ) -> Result<BuildArtifactTree, BuildError> {
    if !tree.path.is_dir() {
      return Err(BuildError::BuildFailed {
        phase: BuildPhase::Configure,
        diagnostics: format!("source directory '{}' does not exist", tree.path.display()),
      });
    }

    let build_dir = self.build_dir(tree, build_type);
    let flags = translate_options(options);
    let flags_hash = self.flags_hash(tree, &build_dir, &flags);
    let complete_path = build_dir.join(BUILD_COMPLETE_MARKER);

    if let Some(marker) = read_marker::<BuildMarker>(&complete_path)
      && marker.matches(&flags_hash, tree.current_ref.as_deref())
    {
      debug!(path = %build_dir.display(), "build is up to date");
      return Ok(BuildArtifactTree {
        path: build_dir,
        build_type,
        flags,
        outcome: BuildOutcome::UpToDate,
      });
    }

    // From here on the artifacts no longer match the recorded inputs.
    remove_marker(&complete_path).await?;

    let reconfigure = read_marker::<ConfigureMarker>(&build_dir.join(CONFIGURE_MARKER))
      .map(|marker| marker.flags_hash != flags_hash)
      .unwrap_or(true);

    if reconfigure {
      self.configure(tree, &build_dir, &flags, &flags_hash, ctx).await?;
    } else {
      debug!(path = %build_dir.display(), "configuration unchanged, reusing");
    }

    self.compile(&build_dir, build_type, ctx).await?;

    write_marker(
      &complete_path,
      &BuildMarker::complete(flags_hash, tree.current_ref.clone()),
    )
    .await?;

    Ok(BuildArtifactTree {
      path: build_dir,
      build_type,
      flags,
      outcome: if reconfigure {
        BuildOutcome::Reconfigured
      } else {
        BuildOutcome::Recompiled
      },
    })
  }

  async fn remove_artifacts(&self, tree: &WorkingTree) -> Result<CleanOutcome, BuildError> {
    let mut outcome = CleanOutcome::default();

    for build_type in BuildType::ALL {
      let build_dir = self.build_dir(tree, build_type);
      match fs::remove_dir_all(&build_dir).await {
        Ok(()) => {
          info!(path = %build_dir.display(), "removed build output");
          outcome.removed.push(build_dir);
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
          debug!(path = %build_dir.display(), "no build output to remove");
        }
        Err(source) => return Err(BuildError::CleanFailed { path: build_dir, source }),
      }
    }

    Ok(outcome)
  }
}

/// Translate an option set into CMake cache flags, in option-name order.
pub fn translate_options(options: &BuildOptionSet) -> Vec<String> {
  options.iter().map(|(name, value)| option_flag(name, value)).collect()
}

fn option_flag(name: &str, value: &OptionValue) -> String {
  match value {
    OptionValue::Bool(true) => format!("-D{name}:BOOL=ON"),
    OptionValue::Bool(false) => format!("-D{name}:BOOL=OFF"),
    OptionValue::Integer(n) => format!("-D{name}:STRING={n}"),
    OptionValue::String(s) => format!("-D{name}:STRING={s}"),
  }
}

fn phase_error(phase: BuildPhase, err: ProcessError) -> BuildError {
  match err {
    ProcessError::Cancelled { .. } => BuildError::Cancelled { phase },
    other => BuildError::BuildFailed {
      phase,
      diagnostics: other.diagnostics(),
    },
  }
}
