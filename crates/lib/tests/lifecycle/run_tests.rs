use std::fs;

use snapforge_lib::collision::CollisionError;
use snapforge_lib::fileset::FileSet;
use snapforge_lib::lifecycle::{LifecycleError, execute};
use snapforge_lib::meta;
use snapforge_lib::project::ProjectError;
use snapforge_lib::state::StateStore;
use snapforge_lib::step::Step;

use crate::common::{ALL, Fixture};

#[test]
fn full_run_stages_prerequisites_and_writes_manifest_last() {
  let fx = Fixture::new();
  let project = fx.base_and_app();

  let report = execute(Step::Strip, &project, ALL, &fx.collaborators()).unwrap();

  for step in Step::ALL {
    assert!(report.executed_step(step, "base"), "{} base did not run", step);
    assert!(report.executed_step(step, "app"), "{} app did not run", step);
  }
  assert_eq!(report.executed.len(), 8);

  let at = |step: Step, part: &str| {
    report
      .executed
      .iter()
      .position(|(s, p)| *s == step && p == part)
      .unwrap()
  };
  assert!(at(Step::Stage, "base") < at(Step::Build, "app"));
  assert!(at(Step::Stage, "app") < at(Step::Strip, "base"));
  assert!(at(Step::Stage, "base") < at(Step::Strip, "app"));

  assert_eq!(fx.calls().last().map(String::as_str), Some("manifest"));
  assert!(fx.position("build base") < fx.position("pull app"));

  let strip = fx.paths().strip_dir();
  assert_eq!(fs::read_to_string(strip.join("bin/base")).unwrap(), "base");
  assert_eq!(fs::read_to_string(strip.join("bin/app")).unwrap(), "app");

  let manifest = report.manifest.unwrap();
  assert!(manifest.starts_with(&strip));
  assert_eq!(meta::read(&strip).unwrap().name, "hello");
}

#[test]
fn second_run_does_nothing() {
  let fx = Fixture::new();
  let project = fx.base_and_app();
  execute(Step::Strip, &project, ALL, &fx.collaborators()).unwrap();
  fx.clear();

  let report = execute(Step::Strip, &project, ALL, &fx.collaborators()).unwrap();

  assert!(report.executed.is_empty());
  assert!(report.skipped.contains(&(Step::Pull, "base".to_string())));
  assert!(report.skipped.contains(&(Step::Strip, "app".to_string())));
  assert_eq!(fx.calls(), vec!["manifest"]);
}

#[test]
fn prepare_hook_runs_before_its_step() {
  let fx = Fixture::new();
  let project = fx.project(vec![fx.part("solo", fx.plugin())]);

  execute(Step::Build, &project, ALL, &fx.collaborators()).unwrap();

  assert_eq!(fx.calls(), vec!["pull solo", "prepare_build solo", "build solo"]);
}

#[test]
fn earlier_target_stops_short() {
  let fx = Fixture::new();
  let project = fx.base_and_app();

  let report = execute(Step::Pull, &project, &["base"], &fx.collaborators()).unwrap();

  assert_eq!(report.executed, vec![(Step::Pull, "base".to_string())]);
  assert!(report.manifest.is_none());
  assert!(!fx.paths().stage_dir().exists());
}

#[test]
fn unstaged_prerequisite_outside_request_is_an_error() {
  let fx = Fixture::new();
  let project = fx.base_and_app();

  let err = execute(Step::Build, &project, &["app"], &fx.collaborators()).unwrap_err();

  match err {
    LifecycleError::UnsatisfiedPrerequisites {
      step,
      part,
      prerequisites,
    } => {
      assert_eq!(step, Step::Pull);
      assert_eq!(part, "app");
      assert_eq!(prerequisites, vec!["base"]);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(fx.calls().is_empty());
}

#[test]
fn staged_prerequisite_lets_a_subset_run() {
  let fx = Fixture::new();
  let project = fx.base_and_app();
  execute(Step::Stage, &project, &["base"], &fx.collaborators()).unwrap();
  fx.clear();

  let report = execute(Step::Build, &project, &["app"], &fx.collaborators()).unwrap();

  assert!(report.executed_step(Step::Build, "app"));
  assert!(!report.executed.iter().any(|(_, p)| p == "base"));
  assert_eq!(fx.calls(), vec!["pull app", "prepare_build app", "build app"]);
}

#[test]
fn chained_prerequisites_are_staged_in_order() {
  let fx = Fixture::new();
  let project = fx.project(vec![
    fx.part("a", fx.plugin().installs("lib/a", "a")),
    fx.part("b", fx.plugin().installs("lib/b", "b")).with_after(["a"]),
    fx.part("c", fx.plugin().installs("bin/c", "c")).with_after(["b"]),
  ]);

  execute(Step::Stage, &project, ALL, &fx.collaborators()).unwrap();

  assert!(fx.position("build a") < fx.position("pull b"));
  assert!(fx.position("build b") < fx.position("pull c"));
  let stage = fx.paths().stage_dir();
  for file in ["lib/a", "lib/b", "bin/c"] {
    assert!(stage.join(file).is_file(), "{} not staged", file);
  }
}

#[test]
fn prerequisite_cycle_is_reported() {
  let fx = Fixture::new();
  let project = fx.project(vec![
    fx.part("a", fx.plugin()).with_after(["b"]),
    fx.part("b", fx.plugin()).with_after(["a"]),
  ]);

  let err = execute(Step::Pull, &project, ALL, &fx.collaborators()).unwrap_err();

  assert!(matches!(err, LifecycleError::PrerequisiteCycle(_)), "got {err}");
}

#[test]
fn collision_blocks_the_whole_stage_step() {
  let fx = Fixture::new();
  let project = fx.project(vec![
    fx.part("one", fx.plugin().installs("bin/tool", "one")),
    fx.part("two", fx.plugin().installs("bin/tool", "two")),
  ]);

  let err = execute(Step::Stage, &project, ALL, &fx.collaborators()).unwrap_err();

  match err {
    LifecycleError::Collision(CollisionError::Conflict { path, parts }) => {
      assert_eq!(path, "bin/tool");
      assert_eq!(parts, vec!["one", "two"]);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(!fx.paths().stage_dir().join("bin/tool").exists());

  let store = StateStore::new(fx.paths());
  for part in ["one", "two"] {
    assert!(store.load(part, Step::Build).unwrap().is_some());
    assert!(store.load(part, Step::Stage).unwrap().is_none());
  }
}

#[test]
fn identical_files_are_not_a_collision() {
  let fx = Fixture::new();
  let project = fx.project(vec![
    fx.part("one", fx.plugin().installs("share/LICENSE", "MIT")),
    fx.part("two", fx.plugin().installs("share/LICENSE", "MIT")),
  ]);

  execute(Step::Stage, &project, ALL, &fx.collaborators()).unwrap();

  let staged = fs::read_to_string(fx.paths().stage_dir().join("share/LICENSE")).unwrap();
  assert_eq!(staged, "MIT");
}

#[test]
fn stage_fileset_narrows_what_is_staged() {
  let fx = Fixture::new();
  let project = fx.project(vec![
    fx.part(
      "tool",
      fx.plugin().installs("bin/tool", "x").installs("share/doc/README", "docs"),
    )
    .with_stage(FileSet::new(["bin"])),
  ]);

  execute(Step::Stage, &project, ALL, &fx.collaborators()).unwrap();

  let stage = fx.paths().stage_dir();
  assert!(stage.join("bin/tool").is_file());
  assert!(!stage.join("share").exists());
}

#[test]
fn changed_inputs_rerun_the_step() {
  let fx = Fixture::new();
  let v1 = fx.project(vec![
    fx.part("tool", fx.plugin()).with_properties(serde_json::json!({"version": 1})),
  ]);
  execute(Step::Build, &v1, ALL, &fx.collaborators()).unwrap();
  fx.clear();

  let v2 = fx.project(vec![
    fx.part("tool", fx.plugin()).with_properties(serde_json::json!({"version": 2})),
  ]);
  let report = execute(Step::Build, &v2, ALL, &fx.collaborators()).unwrap();

  assert!(report.executed_step(Step::Pull, "tool"));
  assert!(report.executed_step(Step::Build, "tool"));
  assert_eq!(fx.calls(), vec!["pull tool", "prepare_build tool", "build tool"]);
}

#[test]
fn failed_step_resumes_where_it_stopped() {
  let fx = Fixture::new();
  let broken = fx.project(vec![fx.part("tool", fx.plugin().failing())]);

  let err = execute(Step::Stage, &broken, ALL, &fx.collaborators()).unwrap_err();
  match err {
    LifecycleError::Step { step, part, .. } => {
      assert_eq!(step, Step::Build);
      assert_eq!(part, "tool");
    }
    other => panic!("unexpected error: {other}"),
  }

  let store = StateStore::new(fx.paths());
  assert!(store.load("tool", Step::Pull).unwrap().is_some());
  assert!(store.load("tool", Step::Build).unwrap().is_none());
  fx.clear();

  let fixed = fx.project(vec![fx.part("tool", fx.plugin().installs("bin/tool", "ok"))]);
  let report = execute(Step::Stage, &fixed, ALL, &fx.collaborators()).unwrap();

  assert!(!report.executed_step(Step::Pull, "tool"));
  assert!(report.executed_step(Step::Build, "tool"));
  assert!(report.executed_step(Step::Stage, "tool"));
}

#[test]
fn later_step_is_unsatisfied_once_an_earlier_one_is_forgotten() {
  let fx = Fixture::new();
  let project = fx.project(vec![fx.part("tool", fx.plugin())]);
  execute(Step::Stage, &project, ALL, &fx.collaborators()).unwrap();

  let store = StateStore::new(fx.paths());
  let inputs = project.part("tool").unwrap().inputs();
  assert!(store.is_satisfied("tool", Step::Stage, &inputs).unwrap());

  store.forget("tool", Step::Build).unwrap();

  assert!(store.is_satisfied("tool", Step::Pull, &inputs).unwrap());
  assert!(!store.is_satisfied("tool", Step::Build, &inputs).unwrap());
  assert!(!store.is_satisfied("tool", Step::Stage, &inputs).unwrap());
}

#[test]
fn unknown_part_fails_before_anything_runs() {
  let fx = Fixture::new();
  let project = fx.base_and_app().with_build_packages(vec!["make".to_string()]);

  let err = execute(Step::Pull, &project, &["nope"], &fx.collaborators()).unwrap_err();

  assert!(matches!(err, LifecycleError::Project(ProjectError::UnknownParts(ref names)) if names == &["nope"]));
  assert!(fx.calls().is_empty());
}

#[test]
fn build_packages_are_installed_first() {
  let fx = Fixture::new();
  let project = fx
    .project(vec![fx.part("tool", fx.plugin()).with_build_packages(vec!["gcc".to_string()])])
    .with_build_packages(vec!["make".to_string()]);

  execute(Step::Pull, &project, ALL, &fx.collaborators()).unwrap();

  assert_eq!(fx.calls(), vec!["install gcc make", "pull tool"]);
}

#[test]
fn narrowed_strip_fileset_drops_excluded_files() {
  let fx = Fixture::new();
  let tool = |fx: &Fixture| fx.part("tool", fx.plugin().installs("bin/tool", "tool").installs("bin/debug", "dbg"));
  let before = fx.project(vec![fx.part("keep", fx.plugin().installs("bin/keep", "keep")), tool(&fx)]);
  execute(Step::Strip, &before, ALL, &fx.collaborators()).unwrap();
  let strip = fx.paths().strip_dir();
  assert!(strip.join("bin/debug").is_file());

  let after = fx.project(vec![
    fx.part("keep", fx.plugin().installs("bin/keep", "keep")),
    tool(&fx).with_strip(FileSet::new(["-bin/debug"])),
  ]);
  let report = execute(Step::Strip, &after, ALL, &fx.collaborators()).unwrap();

  assert!(report.executed_step(Step::Strip, "tool"));
  assert!(!report.executed_step(Step::Stage, "tool"));
  assert!(!strip.join("bin/debug").exists());
  assert!(strip.join("bin/tool").is_file());
  assert!(strip.join("bin/keep").is_file());
  assert!(fx.paths().stage_dir().join("bin/debug").is_file());
}

#[test]
fn rebuild_removes_files_the_new_build_no_longer_stages() {
  let fx = Fixture::new();
  let v1 = fx.project(vec![
    fx.part("tool", fx.plugin().installs("bin/old", "1")).with_properties(serde_json::json!({"version": 1})),
  ]);
  execute(Step::Stage, &v1, ALL, &fx.collaborators()).unwrap();

  let v2 = fx.project(vec![
    fx.part("tool", fx.plugin().installs("bin/new", "2")).with_properties(serde_json::json!({"version": 2})),
  ]);
  execute(Step::Stage, &v2, ALL, &fx.collaborators()).unwrap();

  let stage = fx.paths().stage_dir();
  assert!(!stage.join("bin/old").exists());
  assert!(stage.join("bin/new").is_file());
  assert!(!fx.paths().part("tool").install.join("bin/old").exists());
}

#[test]
fn collision_blocks_prerequisite_staging() {
  let fx = Fixture::new();
  let project = fx.project(vec![
    fx.part("base", fx.plugin().installs("bin/tool", "base")),
    fx.part("app", fx.plugin()).with_after(["base"]),
    fx.part("other", fx.plugin().installs("bin/tool", "other")),
  ]);
  execute(Step::Build, &project, &["other"], &fx.collaborators()).unwrap();

  let err = execute(Step::Build, &project, ALL, &fx.collaborators()).unwrap_err();

  match err {
    LifecycleError::Collision(CollisionError::Conflict { path, parts }) => {
      assert_eq!(path, "bin/tool");
      assert_eq!(parts, vec!["base", "other"]);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(!fx.paths().stage_dir().join("bin/tool").exists());
  let store = StateStore::new(fx.paths());
  assert!(store.load("base", Step::Build).unwrap().is_some());
  assert!(store.load("base", Step::Stage).unwrap().is_none());
  assert!(store.load("app", Step::Pull).unwrap().is_none());
}
