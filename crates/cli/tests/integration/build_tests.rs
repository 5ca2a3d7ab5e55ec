use predicates::prelude::*;

use super::common::{TestEnv, git, git_available};

/// Environment with an `alsoft` remote and a manifest pointing at it.
fn alsoft_env(fail_configure: bool, extra_options: &str) -> (TestEnv, String) {
  let env = TestEnv::empty();
  let (remote, commit) = env.remote("openal-soft", "openal-soft-1.15.1");
  let cmake = env.fake_cmake(fail_configure);
  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, extra_options));
  (env, commit)
}

#[test]
fn build_checks_out_and_compiles() {
  if !git_available() {
    return;
  }
  let (env, commit) = alsoft_env(false, "");

  env
    .depkit_cmd()
    .args(["build", "alsoft"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft (release) configured and built"));

  let tree = env.deps_path().join("openal-soft-src");
  assert_eq!(git(&tree, &["rev-parse", "HEAD"]), commit);
  assert!(tree.join("build-release").join("libopenal.a").exists());

  let calls = env.cmake_calls();
  assert_eq!(calls.len(), 2);
  assert!(calls[0].ends_with(
    "-DALSOFT_CONFIG:BOOL=OFF -DCMAKE_BUILD_TYPE:STRING=Release -DDLOPEN:BOOL=OFF -DEXAMPLES:BOOL=OFF -DUTILS:BOOL=OFF"
  ));
  assert!(calls[1].starts_with("--build"));
  assert!(calls[1].ends_with("--config Release"));
}

#[test]
fn second_build_is_up_to_date() {
  if !git_available() {
    return;
  }
  let (env, _) = alsoft_env(false, "");

  env.depkit_cmd().args(["build", "--all"]).assert().success();
  env
    .depkit_cmd()
    .args(["build", "--all"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft (release) is up to date"));

  assert_eq!(env.cmake_calls().len(), 2);
}

#[test]
fn changed_options_reconfigure() {
  if !git_available() {
    return;
  }
  let (env, _) = alsoft_env(false, "");
  env.depkit_cmd().args(["build", "alsoft"]).assert().success();

  let remote = env.temp.path().join("remotes").join("openal-soft");
  let cmake = env.temp.path().join("fake-cmake");
  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, "build_shared_libs = true"));

  env
    .depkit_cmd()
    .args(["build", "alsoft"])
    .assert()
    .success()
    .stdout(predicate::str::contains("configured and built"));

  let calls = env.cmake_calls();
  assert_eq!(calls.len(), 4);
  assert!(calls[2].contains("-DBUILD_SHARED_LIBS:BOOL=ON"));
}

#[test]
fn debug_builds_use_their_own_directory() {
  if !git_available() {
    return;
  }
  let (env, _) = alsoft_env(false, "");

  env
    .depkit_cmd()
    .args(["build", "alsoft", "--build-type", "debug"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft (debug) configured and built"));

  let tree = env.deps_path().join("openal-soft-src");
  assert!(tree.join("build-debug").join("libopenal.a").exists());
  assert!(!tree.join("build-release").exists());
  assert!(env.cmake_calls()[0].contains("-DCMAKE_BUILD_TYPE:STRING=Debug"));
}

#[test]
fn configure_failure_reports_diagnostics() {
  if !git_available() {
    return;
  }
  let (env, _) = alsoft_env(true, "");

  env
    .depkit_cmd()
    .args(["build", "alsoft"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("alsoft: configure failed"))
    .stderr(predicate::str::contains("CMake Error: Could not find OpenSSL"))
    .stderr(predicate::str::contains("1 of 1 dependencies failed to build"));

  assert_eq!(env.cmake_calls().len(), 1);
}

#[test]
fn foreign_directory_is_left_alone() {
  if !git_available() {
    return;
  }
  let (env, _) = alsoft_env(false, "");
  let tree = env.deps_path().join("openal-soft-src");
  std::fs::create_dir_all(&tree).unwrap();
  std::fs::write(tree.join("notes.txt"), "keep me").unwrap();

  env
    .depkit_cmd()
    .args(["build", "alsoft"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("is not a usable working tree"));

  assert_eq!(std::fs::read_to_string(tree.join("notes.txt")).unwrap(), "keep me");
  assert!(env.cmake_calls().is_empty());
}

#[test]
fn missing_tag_fails_without_building() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (remote, _) = env.remote("openal-soft", "openal-soft-1.14");
  let cmake = env.fake_cmake(false);
  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, ""));

  env
    .depkit_cmd()
    .args(["build", "alsoft"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("ref 'openal-soft-1.15.1' not found"));

  assert!(env.cmake_calls().is_empty());
}

#[test]
fn build_json_output_is_valid() {
  if !git_available() {
    return;
  }
  let (env, commit) = alsoft_env(false, "");

  let output = env
    .depkit_cmd()
    .args(["build", "alsoft", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["build_type"], "release");
  let result = &json["results"][0];
  assert_eq!(result["name"], "alsoft");
  assert_eq!(result["ok"], true);
  assert_eq!(result["report"]["tree"]["current_ref"], commit.as_str());
  assert_eq!(result["report"]["artifacts"]["outcome"], "reconfigured");
  assert_eq!(result["report"]["options"]["DLOPEN"], false);
}
