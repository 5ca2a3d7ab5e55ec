//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Whether a usable `git` is on `PATH`.
pub fn git_available() -> bool {
  StdCommand::new("git")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

/// Run git in `dir` with a fixed identity, returning trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = StdCommand::new("git")
    .args(["-c", "user.name=depkit", "-c", "user.email=depkit@example.com"])
    .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
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

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the manifest, the
/// dependency root, fixture remotes and a fake `cmake`.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("depkit.toml");
    Self { temp, config_path }
  }

  pub fn write_manifest(&self, content: &str) {
    std::fs::write(&self.config_path, content).unwrap();
  }

  /// Where working trees are checked out.
  pub fn deps_path(&self) -> PathBuf {
    self.temp.path().join("deps")
  }

  /// Every argv the fake cmake was called with, one line per call.
  pub fn cmake_calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.temp.path().join("cmake.log"))
      .map(|s| s.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  /// Create a remote with one commit tagged `tag`, returning its path and commit id.
  pub fn remote(&self, name: &str, tag: &str) -> (PathBuf, String) {
    let path = self.temp.path().join("remotes").join(name);
    std::fs::create_dir_all(&path).unwrap();
    git(&path, &["init", "-q"]);
    std::fs::write(path.join("CMakeLists.txt"), format!("project({name})\n")).unwrap();
    git(&path, &["add", "CMakeLists.txt"]);
    git(&path, &["commit", "-q", "-m", "import"]);
    git(&path, &["tag", tag]);
    let commit = git(&path, &["rev-parse", "HEAD"]);
    (path, commit)
  }

  /// Write a stand-in for `cmake` that logs its argv.
  ///
  /// With `fail_configure` set, configure calls print a CMake error and exit 1.
  #[cfg(unix)]
  pub fn fake_cmake(&self, fail_configure: bool) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let failure = if fail_configure {
      "echo 'CMake Error: Could not find OpenSSL' >&2; exit 1"
    } else {
      ":"
    };
    let script = format!(
      r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
if [ "$1" = "--build" ]; then
  touch "$2/libopenal.a"
else
  {failure}
  touch "$4/CMakeCache.txt"
fi
"#,
      log = self.temp.path().join("cmake.log").display(),
    );

    let path = self.temp.path().join("fake-cmake");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  /// A manifest with a single `alsoft` dependency pointing at `remote`.
  pub fn alsoft_manifest(&self, remote: &Path, cmake: &Path, extra_options: &str) -> String {
    format!(
      r#"
[settings]
root = "deps"
cmake = "{cmake}"
timeout_secs = 120

[[dependency]]
name = "alsoft"
description = "build OpenAL Soft"
clean_description = "clean built OpenAL soft libraries"
uri = "{uri}"
directory = "openal-soft-src"
tag = "openal-soft-1.15.1"

[dependency.options]
dlopen = false
utils = false
examples = false
alsoft_config = false
{extra_options}
"#,
      cmake = cmake.display(),
      uri = remote.display(),
    )
  }

  /// Get a pre-configured Command for the depkit binary.
  ///
  /// Runs inside the temp directory with `DEPKIT_CONFIG` pointing at the
  /// test manifest and no inherited `DEPKIT_ROOT`.
  pub fn depkit_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("depkit");
    cmd.current_dir(self.temp.path());
    cmd.env("DEPKIT_CONFIG", &self.config_path);
    cmd.env_remove("DEPKIT_ROOT");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
