//! Marker files recording what a build directory was produced from.
//!
//! Markers live inside the build directory, so removing the artifact tree also
//! removes every trace of the build. A marker is written only after the step
//! it describes succeeded; a missing or unreadable marker means the step must
//! run again.

use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::build::BuildError;

const MARKER_VERSION: u32 = 1;

/// Written after a successful configure step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureMarker {
  pub version: u32,
  /// Hash of the full configure invocation.
  pub flags_hash: String,
  /// Option flags, for humans inspecting the build directory.
  pub flags: Vec<String>,
}

impl ConfigureMarker {
  pub fn new(flags_hash: String, flags: Vec<String>) -> Self {
    Self {
      version: MARKER_VERSION,
      flags_hash,
      flags,
    }
  }
}

/// Written after a successful compile step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMarker {
  pub version: u32,
  /// Build status (always "complete" for successful builds).
  pub status: String,
  pub flags_hash: String,
  /// Commit the sources were at when compiled.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_commit: Option<String>,
}

impl BuildMarker {
  pub fn complete(flags_hash: String, source_commit: Option<String>) -> Self {
    Self {
      version: MARKER_VERSION,
      status: "complete".to_string(),
      flags_hash,
      source_commit,
    }
  }

  /// Whether the artifacts were produced from exactly these inputs.
  pub fn matches(&self, flags_hash: &str, source_commit: Option<&str>) -> bool {
    self.status == "complete" && self.flags_hash == flags_hash && self.source_commit.as_deref() == source_commit
  }
}

/// Read a marker.
///
/// Returns `None` if the marker doesn't exist or cannot be parsed.
pub fn read_marker<T: DeserializeOwned>(path: &Path) -> Option<T> {
  let content = std::fs::read_to_string(path).ok()?;
  match serde_json::from_str(&content) {
    Ok(marker) => Some(marker),
    Err(e) => {
      debug!(path = %path.display(), error = %e, "invalid marker, ignoring");
      None
    }
  }
}

pub async fn write_marker<T: Serialize>(path: &Path, marker: &T) -> Result<(), BuildError> {
  let content = serde_json::to_string(marker).map_err(|e| BuildError::Io {
    path: path.to_path_buf(),
    source: io::Error::other(e),
  })?;
  fs::write(path, format!("{content}\n"))
    .await
    .map_err(|source| BuildError::Io {
      path: path.to_path_buf(),
      source,
    })
}

/// Remove a marker; a marker that does not exist is already removed.
pub async fn remove_marker(path: &Path) -> Result<(), BuildError> {
  match fs::remove_file(path).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(BuildError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}
