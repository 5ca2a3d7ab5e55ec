//! Types for native builds.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Build configuration, threaded explicitly through every build call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
  Debug,
  #[default]
  Release,
}

impl BuildType {
  pub const ALL: [BuildType; 2] = [BuildType::Debug, BuildType::Release];

  pub fn as_str(self) -> &'static str {
    match self {
      BuildType::Debug => "debug",
      BuildType::Release => "release",
    }
  }

  /// Configuration name understood by CMake (`CMAKE_BUILD_TYPE`, `--config`).
  pub fn cmake_name(self) -> &'static str {
    match self {
      BuildType::Debug => "Debug",
      BuildType::Release => "Release",
    }
  }
}

impl fmt::Display for BuildType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for BuildType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "debug" => Ok(BuildType::Debug),
      "release" => Ok(BuildType::Release),
      other => Err(format!("unknown build type '{other}' (expected 'debug' or 'release')")),
    }
  }
}

/// Step of a native build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
  Configure,
  Compile,
}

impl fmt::Display for BuildPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildPhase::Configure => write!(f, "configure"),
      BuildPhase::Compile => write!(f, "compile"),
    }
  }
}

/// What a build call had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
  /// Configure and compile both ran.
  Reconfigured,
  /// The existing configuration was reused and only compile ran.
  Recompiled,
  /// Nothing ran; the artifacts match the sources and options.
  UpToDate,
}

/// Generated build output for one working tree and build type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifactTree {
  pub path: PathBuf,
  pub build_type: BuildType,
  /// Option flags passed to the configure step, in invocation order.
  pub flags: Vec<String>,
  pub outcome: BuildOutcome,
}

/// Result of removing build output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanOutcome {
  pub removed: Vec<PathBuf>,
}

impl CleanOutcome {
  pub fn is_noop(&self) -> bool {
    self.removed.is_empty()
  }
}

/// Errors that can occur during native builds.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The build tool failed.
  #[error("{phase} failed:\n{diagnostics}")]
  BuildFailed { phase: BuildPhase, diagnostics: String },

  /// Build output could not be removed.
  #[error("failed to remove '{path}': {source}")]
  CleanFailed {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The run was cancelled while the build tool was running.
  #[error("{phase} was cancelled")]
  Cancelled { phase: BuildPhase },

  /// Failed to manage the build directory or its markers.
  #[error("failed to update '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
