//! Types for source acquisition.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a dependency's sources come from and which revision to use.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocator {
  repository_uri: String,
  local_directory_name: String,
  pinned_ref: String,
}

impl SourceLocator {
  pub fn new(
    repository_uri: impl Into<String>,
    local_directory_name: impl Into<String>,
    pinned_ref: impl Into<String>,
  ) -> Self {
    Self {
      repository_uri: repository_uri.into(),
      local_directory_name: local_directory_name.into(),
      pinned_ref: pinned_ref.into(),
    }
  }

  pub fn repository_uri(&self) -> &str {
    &self.repository_uri
  }

  pub fn local_directory_name(&self) -> &str {
    &self.local_directory_name
  }

  /// Tag, branch or full commit id the working tree must resolve to.
  pub fn pinned_ref(&self) -> &str {
    &self.pinned_ref
  }
}

impl fmt::Display for SourceLocator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{} -> {}", self.repository_uri, self.pinned_ref, self.local_directory_name)
  }
}

/// Observed state of a checkout on disk.
///
/// Values are only meaningful at the time they were observed; nothing here is
/// cached between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingTree {
  pub path: PathBuf,
  pub exists: bool,
  /// Commit id HEAD pointed at when observed.
  pub current_ref: Option<String>,
}

impl WorkingTree {
  /// Observe only whether the directory exists, without consulting the VCS.
  pub fn at(path: &Path) -> Self {
    Self {
      path: path.to_path_buf(),
      exists: path.is_dir(),
      current_ref: None,
    }
  }
}

/// The VCS operation an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsOperation {
  Clone,
  Fetch,
  Checkout,
}

impl fmt::Display for VcsOperation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VcsOperation::Clone => write!(f, "clone"),
      VcsOperation::Fetch => write!(f, "fetch"),
      VcsOperation::Checkout => write!(f, "checkout"),
    }
  }
}

/// Errors that can occur while acquiring sources.
#[derive(Debug, Error)]
pub enum VcsError {
  /// The local directory exists but cannot be used as a checkout of the locator.
  ///
  /// The directory is left untouched; removing it is the caller's decision.
  #[error("'{path}' is not a usable working tree: {reason}")]
  CorruptWorkingTree { path: PathBuf, reason: String },

  /// The pinned ref does not exist in the repository.
  #[error("ref '{reference}' not found in '{uri}'")]
  RefNotFound { uri: String, reference: String },

  /// The VCS tool reported a failure.
  #[error("git {operation} failed for '{uri}':\n{diagnostics}")]
  CommandFailed {
    operation: VcsOperation,
    uri: String,
    diagnostics: String,
  },

  /// The run was cancelled while the VCS tool was running.
  #[error("git {operation} was cancelled")]
  Cancelled { operation: VcsOperation },

  /// Failed to prepare the directory the checkout lives in.
  #[error("failed to access '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
