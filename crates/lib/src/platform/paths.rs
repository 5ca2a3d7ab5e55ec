use std::path::{Path, PathBuf};

use crate::consts::{CONFIG_ENV, CONFIG_FILENAME, ROOT_ENV};

/// Returns the current working directory, falling back to `.` when it cannot be read.
pub fn current_dir() -> PathBuf {
  std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the manifest path to load.
///
/// An explicit path wins, then `DEPKIT_CONFIG`, then `depkit.toml` in the
/// current directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
  if let Some(path) = explicit {
    return path.to_path_buf();
  }
  std::env::var(CONFIG_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|_| current_dir().join(CONFIG_FILENAME))
}

/// Returns the directory working trees are checked out into.
///
/// `DEPKIT_ROOT` overrides the configured root. Relative roots are resolved
/// against `base` (the manifest's directory).
pub fn root_dir(configured: &Path, base: &Path) -> PathBuf {
  let root = std::env::var(ROOT_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|_| configured.to_path_buf());

  let joined = if root.is_absolute() { root } else { base.join(root) };
  dunce::canonicalize(&joined).unwrap_or(joined)
}
