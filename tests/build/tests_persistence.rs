//! States written to disk and read back by a later session.

use std::fs;

use cascade::build::{BuildContext, BuildOptions, BuildStatus, Builder, STATE_FILE_SUFFIX};
use cascade::changes::ChangeSet;
use cascade::compiler::OutlineCompiler;
use tempfile::tempdir;

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

#[test]
fn test_reloaded_states_need_no_work() {
    let dir = tempdir().expect("temp dir");
    let snapshot = indirect_workspace();

    let builder = builder();
    let first = full_build(&builder, &snapshot);
    builder
        .into_context()
        .save_to_dir(dir.path())
        .expect("save states");

    let context =
        BuildContext::load_from_dir(dir.path(), BuildOptions::default()).expect("load states");
    assert_eq!(context.states().len(), 3);
    let reloaded = Builder::with_context(OutlineCompiler::new(), context);
    let second = incremental_build(&reloaded, &snapshot, ChangeSet::new());

    assert!(second.order.is_empty());
    assert_eq!(second.problems, first.problems);
    assert_eq!(second.status, BuildStatus::Complete);
}

#[test]
fn test_reloaded_states_still_track_dependents() {
    let dir = tempdir().expect("temp dir");
    let builder = builder();
    full_build(&builder, &a_b_workspace(A_SOURCE));
    builder
        .into_context()
        .save_to_dir(dir.path())
        .expect("save states");

    let context =
        BuildContext::load_from_dir(dir.path(), BuildOptions::default()).expect("load states");
    let reloaded = Builder::with_context(OutlineCompiler::new(), context);
    let result = incremental_build(
        &reloaded,
        &a_b_workspace("package a;\npublic class A { method void run() }\n"),
        ChangeSet::new().modified("A", A_PATH),
    );

    assert_eq!(
        compiled(&result),
        vec!["/A/src/a/A.java", "/B/src/b/B.java"]
    );
}

#[test]
fn test_stale_state_files_are_removed() {
    let dir = tempdir().expect("temp dir");
    let builder = builder();
    full_build(&builder, &indirect_workspace());
    builder.inspect(|ctx| ctx.save_to_dir(dir.path())).expect("save");
    assert!(dir.path().join(format!("P1{STATE_FILE_SUFFIX}")).exists());

    let mut without_p1 = indirect_workspace();
    without_p1.remove_project(&"P1".into());
    without_p1.replace_project(project("P2"));
    incremental_build(&builder, &without_p1, ChangeSet::new());
    builder.inspect(|ctx| ctx.save_to_dir(dir.path())).expect("save");

    assert!(!dir.path().join(format!("P1{STATE_FILE_SUFFIX}")).exists());
    assert!(dir.path().join(format!("P2{STATE_FILE_SUFFIX}")).exists());
}

#[test]
fn test_missing_directory_loads_empty_context() {
    let dir = tempdir().expect("temp dir");

    let context = BuildContext::load_from_dir(&dir.path().join("absent"), BuildOptions::default())
        .expect("load");

    assert!(context.states().is_empty());
}

#[test]
fn test_incompatible_state_file_is_skipped() {
    let dir = tempdir().expect("temp dir");
    let builder = builder();
    full_build(&builder, &a_b_workspace(A_SOURCE));
    builder.inspect(|ctx| ctx.save_to_dir(dir.path())).expect("save");

    let path = dir.path().join(format!("A{STATE_FILE_SUFFIX}"));
    let mut json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    json["fingerprint_version"] = serde_json::Value::from(0u32);
    fs::write(&path, json.to_string()).expect("write");

    let context =
        BuildContext::load_from_dir(dir.path(), BuildOptions::default()).expect("load states");

    assert!(context.state(&"A".into()).is_none());
    assert!(context.state(&"B".into()).is_some());
}
