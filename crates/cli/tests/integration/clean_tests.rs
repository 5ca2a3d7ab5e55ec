use predicates::prelude::*;

use super::common::{TestEnv, git, git_available};

fn built_alsoft() -> (TestEnv, String) {
  let env = TestEnv::empty();
  let (remote, commit) = env.remote("openal-soft", "openal-soft-1.15.1");
  let cmake = env.fake_cmake(false);
  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, ""));
  env.depkit_cmd().args(["build", "alsoft"]).assert().success();
  (env, commit)
}

#[test]
fn clean_removes_build_output_but_keeps_sources() {
  if !git_available() {
    return;
  }
  let (env, commit) = built_alsoft();
  let tree = env.deps_path().join("openal-soft-src");

  env
    .depkit_cmd()
    .args(["clean", "alsoft"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: removed build output"));

  assert!(!tree.join("build-release").exists());
  assert!(tree.join("CMakeLists.txt").exists());
  assert_eq!(git(&tree, &["rev-parse", "HEAD"]), commit);
}

#[test]
fn clean_twice_is_a_noop() {
  if !git_available() {
    return;
  }
  let (env, _) = built_alsoft();

  env.depkit_cmd().args(["clean", "--all"]).assert().success();
  env
    .depkit_cmd()
    .args(["clean", "--all"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: nothing to clean"));
}

#[test]
fn rebuild_after_clean_runs_cmake_again() {
  if !git_available() {
    return;
  }
  let (env, _) = built_alsoft();

  env.depkit_cmd().args(["clean", "alsoft"]).assert().success();
  env
    .depkit_cmd()
    .args(["build", "alsoft"])
    .assert()
    .success()
    .stdout(predicate::str::contains("configured and built"));

  assert_eq!(env.cmake_calls().len(), 4);
}

#[test]
fn clean_json_lists_removed_directories() {
  if !git_available() {
    return;
  }
  let (env, _) = built_alsoft();

  let output = env.depkit_cmd().args(["clean", "alsoft", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json[0]["name"], "alsoft");
  let removed = json[0]["report"]["removed"].as_array().unwrap();
  assert_eq!(removed.len(), 1);
  assert!(removed[0].as_str().unwrap().ends_with("build-release"));
}
