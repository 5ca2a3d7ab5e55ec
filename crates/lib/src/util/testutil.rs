//! Test utilities for depkit-lib.
//!
//! Helpers to run shell snippets, build throwaway git remotes and stand in
//! for the native build tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::process::Invocation;

/// Returns an invocation running a script through the system shell.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> Invocation {
  Invocation::new("/bin/sh").arg("-c").arg(script)
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> Invocation {
  Invocation::new("cmd.exe").arg("/C").arg(script)
}

/// Whether a usable `git` is on `PATH`.
pub fn git_available() -> bool {
  Command::new("git")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

/// Run git synchronously in `dir` with a fixed identity, returning trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args([
      "-c",
      "user.name=depkit",
      "-c",
      "user.email=depkit@example.com",
      "-c",
      "commit.gpgsign=false",
      "-c",
      "tag.gpgsign=false",
    ])
    .args(args)
    .current_dir(dir)
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A throwaway repository acting as the remote of a dependency.
///
/// The repository is removed when dropped.
pub struct RemoteRepo {
  _temp: TempDir,
  pub path: PathBuf,
}

impl RemoteRepo {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("remote");
    std::fs::create_dir(&path).unwrap();
    git(&path, &["init", "-q"]);
    git(&path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    Self { _temp: temp, path }
  }

  pub fn uri(&self) -> String {
    self.path.to_string_lossy().to_string()
  }

  /// Write a file and commit it, returning the new commit id.
  pub fn commit(&self, file: &str, content: &str, message: &str) -> String {
    std::fs::write(self.path.join(file), content).unwrap();
    git(&self.path, &["add", file]);
    git(&self.path, &["commit", "-q", "-m", message]);
    self.rev("HEAD")
  }

  pub fn tag(&self, name: &str) {
    git(&self.path, &["tag", name]);
  }

  pub fn annotated_tag(&self, name: &str, message: &str) {
    git(&self.path, &["tag", "-a", name, "-m", message]);
  }

  pub fn rev(&self, rev: &str) -> String {
    git(&self.path, &["rev-parse", rev])
  }
}

/// Which phase a fake build tool should fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
  Never,
  Configure,
  Compile,
}

/// Write a stand-in for `cmake` that appends its argv to `log`.
///
/// Configure calls (`-S <src> -B <build> ...`) create `CMakeCache.txt` in the
/// build directory, build calls (`--build <dir> ...`) create `libfake.a`.
#[cfg(unix)]
pub fn fake_cmake(dir: &Path, log: &Path, fail_at: FailAt) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let configure_failure = match fail_at {
    FailAt::Configure => "echo 'CMake Error: bad option' >&2; exit 1",
    _ => ":",
  };
  let compile_failure = match fail_at {
    FailAt::Compile => "echo 'error: undefined reference' >&2; exit 2",
    _ => ":",
  };

  let script = format!(
    r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
if [ "$1" = "--build" ]; then
  {compile_failure}
  touch "$2/libfake.a"
else
  {configure_failure}
  touch "$4/CMakeCache.txt"
fi
"#,
    log = log.display(),
  );

  let path = dir.join("fake-cmake");
  std::fs::write(&path, script).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Lines appended to a fake tool's log, or nothing if it never ran.
pub fn logged_calls(log: &Path) -> Vec<String> {
  std::fs::read_to_string(log)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
