//! Incremental recompilation: what a change recompiles, and what it does not.

use cascade::build::{BuildOptions, BuildStatus, Builder};
use cascade::changes::ChangeSet;
use cascade::compiler::OutlineCompiler;
use cascade::workspace::WorkspaceSnapshot;
use rstest::rstest;

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

const X_PATH: &str = "src/p1/X.java";
const W_PATH: &str = "src/p1/W.java";
const X_USES_W: &str = "package p1;\npublic class X { field W w }\n";
const W_SOURCE: &str = "package p1;\npublic class W { }\n";

fn single_project() -> WorkspaceSnapshot {
    WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_source("P1", X_PATH, X_USES_W)
}

#[test]
fn test_full_build_compiles_dependencies_first() {
    let builder = builder();
    let result = full_build(&builder, &a_b_workspace(A_SOURCE));

    assert_eq!(result.status, BuildStatus::Complete);
    assert_eq!(
        compiled(&result),
        vec!["/A/src/a/A.java", "/B/src/b/B.java"]
    );
    assert_no_problems(&result);
}

#[rstest]
#[case::field_added("package a;\npublic class A { field int x }\n", true)]
#[case::modifier_added("package a;\npublic final class A { }\n", true)]
#[case::supertype_added("package a;\npublic class A implements Runnable { }\n", true)]
#[case::nullness_annotation("package a;\n@NonNull public class A { }\n", true)]
#[case::comment_in_body("package a;\npublic class A { // note\n}\n", false)]
#[case::comment_before_type("package a;\n/* header */\npublic class A { }\n", false)]
#[case::other_annotation("package a;\n@Deprecated public class A { }\n", false)]
fn test_edit_recompiles_dependents_only_on_structural_change(
    #[case] edited: &str,
    #[case] dependents_rebuilt: bool,
) {
    let builder = builder();
    full_build(&builder, &a_b_workspace(A_SOURCE));

    let result = incremental_build(
        &builder,
        &a_b_workspace(edited),
        ChangeSet::new().modified("A", A_PATH),
    );

    let mut expected = vec!["/A/src/a/A.java"];
    if dependents_rebuilt {
        expected.push("/B/src/b/B.java");
    }
    assert_eq!(compiled(&result), expected);
    assert_eq!(result.status, BuildStatus::Complete);
}

#[test]
fn test_unchanged_text_is_skipped() {
    let builder = builder();
    let snapshot = a_b_workspace(A_SOURCE);
    full_build(&builder, &snapshot);

    let result = incremental_build(&builder, &snapshot, ChangeSet::new().modified("A", A_PATH));

    assert!(result.order.is_empty());
}

#[test]
fn test_empty_change_set_is_idempotent() {
    let builder = builder();
    let snapshot = indirect_workspace();
    let first = full_build(&builder, &snapshot);

    let second = incremental_build(&builder, &snapshot, ChangeSet::new());

    assert!(second.order.is_empty());
    assert_eq!(second.problems, first.problems);
    assert_eq!(second.status, BuildStatus::Complete);
}

#[test]
fn test_removed_unit_breaks_dependents() {
    let builder = builder();
    full_build(&builder, &a_b_workspace(A_SOURCE));

    let without_a = WorkspaceSnapshot::new()
        .with_project(project("A"))
        .with_project(project("B").requires("A"))
        .with_source("B", B_PATH, B_SOURCE);
    let result = incremental_build(&builder, &without_a, ChangeSet::new().removed("A", A_PATH));

    assert_eq!(compiled(&result), vec!["/B/src/b/B.java"]);
    assert_eq!(
        unit_messages(&result, "B", B_PATH),
        vec!["A cannot be resolved to a type"]
    );
    let a_has_units = builder.inspect(|ctx| {
        ctx.state(&cascade::ProjectId::new("A"))
            .is_some_and(|s| s.units().next().is_some())
    });
    assert!(!a_has_units);
}

#[test]
fn test_added_type_fixes_local_reference_in_one_step() {
    let builder = builder();
    let before = full_build(&builder, &single_project());
    assert_eq!(
        unit_messages(&before, "P1", X_PATH),
        vec!["W cannot be resolved to a type"]
    );

    let with_w = single_project().with_source("P1", W_PATH, W_SOURCE);
    let result = incremental_build(&builder, &with_w, ChangeSet::new().added("P1", W_PATH));

    assert_eq!(result.order.len(), 1);
    assert_eq!(
        compiled(&result),
        vec!["/P1/src/p1/W.java", "/P1/src/p1/X.java"]
    );
    assert_no_problems(&result);
}

#[test]
fn test_compile_loop_limit_leaves_units_pending() {
    let builder = Builder::with_options(
        OutlineCompiler::new(),
        BuildOptions::default().with_max_compile_loop(1),
    );
    full_build(&builder, &single_project());

    let with_w = single_project().with_source("P1", W_PATH, W_SOURCE);
    let limited = incremental_build(&builder, &with_w, ChangeSet::new().added("P1", W_PATH));

    assert_eq!(limited.status, BuildStatus::Incomplete);
    assert_eq!(compiled(&limited), vec!["/P1/src/p1/W.java"]);
    let pending = builder.inspect(|ctx| {
        ctx.state(&cascade::ProjectId::new("P1"))
            .map(|s| s.pending().len())
    });
    assert_eq!(pending, Some(1));

    let follow_up = incremental_build(&builder, &with_w, ChangeSet::new());

    assert_eq!(follow_up.status, BuildStatus::Complete);
    assert_eq!(compiled(&follow_up), vec!["/P1/src/p1/X.java"]);
    assert_no_problems(&follow_up);
}

#[test]
fn test_parallel_units_match_sequential_build() {
    let snapshot = a_b_workspace(A_SOURCE)
        .with_source("A", "src/a/A2.java", "package a;\npublic class A2 extends A { }\n")
        .with_source("A", "src/a/A3.java", "package a;\npublic class A3 { field Missing m }\n")
        .with_source("B", "src/b/B2.java", "package b;\npublic class B2 extends B { }\n");

    let sequential = full_build(&builder(), &snapshot);
    let parallel = full_build(
        &Builder::with_options(
            OutlineCompiler::new(),
            BuildOptions::default().with_parallel_units(true),
        ),
        &snapshot,
    );

    assert_eq!(compiled(&parallel), compiled(&sequential));
    assert_eq!(parallel.problems, sequential.problems);
    assert_eq!(
        unit_messages(&parallel, "A", "src/a/A3.java"),
        vec!["Missing cannot be resolved to a type"]
    );
}

#[test]
fn test_full_build_discards_previous_state() {
    let builder = builder();
    let snapshot = a_b_workspace(A_SOURCE);
    full_build(&builder, &snapshot);

    let again = full_build(&builder, &snapshot);

    assert_eq!(
        compiled(&again),
        vec!["/A/src/a/A.java", "/B/src/b/B.java"]
    );
}

#[test]
fn test_structural_change_propagates_through_three_projects() {
    let snapshot = WorkspaceSnapshot::new()
        .with_project(project("A"))
        .with_project(project("B").requires("A"))
        .with_project(project("C").requires("B"))
        .with_source("A", A_PATH, A_SOURCE)
        .with_source(
            "B",
            B_PATH,
            "package b;\nimport a.*;\npublic class B { field Thing thing }\n",
        )
        .with_source(
            "C",
            "src/c/C.java",
            "package c;\nimport b.B;\npublic class C { field B b }\n",
        );
    let builder = builder();
    let first = full_build(&builder, &snapshot);
    assert_eq!(
        unit_messages(&first, "B", B_PATH),
        vec!["Thing cannot be resolved to a type"]
    );

    // a.Thing now binds B's field, which changes B's shape and reaches C.
    let with_thing = snapshot.with_source("A", "src/a/Thing.java", "package a;\npublic class Thing { }\n");
    let result = incremental_build(
        &builder,
        &with_thing,
        ChangeSet::new().added("A", "src/a/Thing.java"),
    );

    assert_eq!(
        compiled(&result),
        vec!["/A/src/a/Thing.java", "/B/src/b/B.java", "/C/src/c/C.java"]
    );
    assert_no_problems(&result);
}
