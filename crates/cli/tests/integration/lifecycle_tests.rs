//! Step command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn executed(stdout: &[u8]) -> Vec<(String, String)> {
  let report: serde_json::Value = serde_json::from_slice(stdout).unwrap();
  report["executed"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| (e["step"].as_str().unwrap().to_string(), e["part"].as_str().unwrap().to_string()))
    .collect()
}

#[test]
fn strip_merges_every_part() {
  let env = TestEnv::base_and_app();

  env
    .snapforge_cmd()
    .arg("strip")
    .assert()
    .success()
    .stdout(predicate::str::contains("strip complete"))
    .stdout(predicate::str::contains("Manifest"));

  assert_eq!(std::fs::read_to_string(env.path("strip/bin/app")).unwrap(), "app");
  assert_eq!(std::fs::read_to_string(env.path("strip/lib/libbase.so")).unwrap(), "base");
  let manifest = std::fs::read_to_string(env.path("strip/meta/package.yaml")).unwrap();
  assert!(manifest.contains("name: hello"));
}

#[test]
fn second_run_skips_completed_steps() {
  let env = TestEnv::base_and_app();
  env.snapforge_cmd().arg("stage").assert().success();

  env
    .snapforge_cmd()
    .arg("stage")
    .assert()
    .success()
    .stdout(predicate::str::contains("(already ran)"))
    .stderr(predicate::str::contains("skipping"));
}

#[test]
fn json_report_lists_executed_steps() {
  let env = TestEnv::base_and_app();

  let output = env.snapforge_cmd().args(["--format", "json", "build"]).output().unwrap();
  assert!(output.status.success());

  let steps = executed(&output.stdout);
  assert_eq!(steps.len(), 5);
  assert!(!steps.iter().any(|(s, p)| s == "stage" && p == "app"));
  let base_stage = steps.iter().position(|(s, p)| s == "stage" && p == "base").unwrap();
  let app_build = steps.iter().position(|(s, p)| s == "build" && p == "app").unwrap();
  assert!(base_stage < app_build);
}

#[test]
fn subset_with_unstaged_prerequisite_fails() {
  let env = TestEnv::base_and_app();

  env
    .snapforge_cmd()
    .args(["build", "app"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unsatisfied prerequisites"))
    .stderr(predicate::str::contains("base"));

  assert!(!env.exists("parts/app"));
}

#[test]
fn subset_after_prerequisite_is_staged() {
  let env = TestEnv::base_and_app();
  env.snapforge_cmd().args(["stage", "base"]).assert().success();

  let output = env
    .snapforge_cmd()
    .args(["--format", "json", "build", "app"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let steps = executed(&output.stdout);
  assert!(steps.iter().all(|(_, p)| p == "app"));
  assert!(env.exists("parts/app/install/bin/app"));
}

#[test]
fn changed_options_rerun_pull() {
  let env = TestEnv::base_and_app();
  env.snapforge_cmd().arg("build").assert().success();

  env.write_file("app-v2/bin/app", "app v2");
  env.write_file(
    "snapforge.yaml",
    &super::common::BASE_AND_APP.replace("source: app-src", "source: app-v2"),
  );

  let output = env.snapforge_cmd().args(["--format", "json", "build"]).output().unwrap();
  assert!(output.status.success());

  let steps = executed(&output.stdout);
  assert!(steps.contains(&("pull".to_string(), "app".to_string())));
  assert!(!steps.iter().any(|(s, p)| s == "pull" && p == "base"));
  assert_eq!(
    std::fs::read_to_string(env.path("parts/app/install/bin/app")).unwrap(),
    "app v2"
  );
}

#[test]
fn conflicting_parts_fail_to_stage() {
  let env = TestEnv::new(
    r#"
name: clash
version: "1.0"
parts:
  one:
    plugin: copy
    source: one
  two:
    plugin: copy
    source: two
"#,
  );
  env.write_file("one/bin/tool", "one");
  env.write_file("two/bin/tool", "two");

  env
    .snapforge_cmd()
    .arg("stage")
    .assert()
    .failure()
    .stderr(predicate::str::contains("bin/tool"));

  assert!(!env.exists("stage/bin/tool"));
}

#[test]
fn missing_source_reports_failed_step() {
  let env = TestEnv::new(BROKEN_SOURCE);

  env
    .snapforge_cmd()
    .arg("pull")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to pull 'lost'"));
}

const BROKEN_SOURCE: &str = r#"
name: broken
version: "1.0"
parts:
  lost:
    plugin: copy
    source: does-not-exist
"#;

#[cfg(unix)]
#[test]
fn shell_part_builds_with_part_environment() {
  let env = TestEnv::new(
    r#"
name: scripted
version: "1.0"
parts:
  hi:
    plugin: shell
    build: mkdir -p "$SNAPFORGE_PART_INSTALL/bin" && echo "$SNAPFORGE_PART_NAME" > "$SNAPFORGE_PART_INSTALL/bin/hi"
"#,
  );

  env.snapforge_cmd().arg("stage").assert().success();

  assert_eq!(std::fs::read_to_string(env.path("stage/bin/hi")).unwrap(), "hi\n");
}

#[test]
fn invalid_project_fails_to_load() {
  let env = TestEnv::new("version: 1.0\nparts: {}\n");

  env
    .snapforge_cmd()
    .arg("pull")
    .assert()
    .failure()
    .stderr(predicate::str::contains("name"));
}
