use predicates::prelude::*;

use super::common::{TestEnv, git_available};

#[test]
fn status_follows_build_and_clean() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (remote, commit) = env.remote("openal-soft", "openal-soft-1.15.1");
  let cmake = env.fake_cmake(false);
  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, ""));
  let short = &commit[..12];

  env
    .depkit_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: not checked out"));

  env.depkit_cmd().args(["build", "alsoft"]).assert().success();
  env
    .depkit_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: built (release)"))
    .stdout(predicate::str::contains(short));

  env
    .depkit_cmd()
    .args(["status", "--build-type", "debug"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: checked out"));

  env.depkit_cmd().args(["clean", "alsoft"]).assert().success();
  env
    .depkit_cmd()
    .args(["status", "alsoft"])
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: checked out"));
}

#[test]
fn status_flags_unusable_directories() {
  let env = TestEnv::empty();
  env.write_manifest(&env.alsoft_manifest(
    &env.temp.path().join("remotes").join("openal-soft"),
    &env.temp.path().join("fake-cmake"),
    "",
  ));
  let tree = env.deps_path().join("openal-soft-src");
  std::fs::create_dir_all(&tree).unwrap();
  std::fs::write(tree.join("README"), "not a checkout").unwrap();

  env
    .depkit_cmd()
    .arg("status")
    .assert()
    .failure()
    .stderr(predicate::str::contains("is not a usable working tree"));
}

#[test]
fn status_after_option_change_is_not_built() {
  if !git_available() {
    return;
  }
  let env = TestEnv::empty();
  let (remote, _) = env.remote("openal-soft", "openal-soft-1.15.1");
  let cmake = env.fake_cmake(false);
  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, ""));
  env.depkit_cmd().args(["build", "alsoft"]).assert().success();

  env.write_manifest(&env.alsoft_manifest(&remote, &cmake, "build_shared_libs = true"));

  env
    .depkit_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("alsoft: checked out"));
}
