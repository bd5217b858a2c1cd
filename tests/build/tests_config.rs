//! Build path reconfiguration between builds.

use cascade::ProjectId;
use cascade::access::{AccessRule, AccessRuleSet};
use cascade::changes::ChangeSet;
use cascade::workspace::{BinaryType, Library, LibraryEntry, RequiredProject, WorkspaceSnapshot};

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

fn three_projects(p2: cascade::workspace::Project) -> WorkspaceSnapshot {
    WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_project(p2)
        .with_project(project("P3").requires("P1"))
        .with_source("P1", "src/p1/A.java", "package p1;\npublic class A { }\n")
        .with_source(
            "P2",
            "src/p2/B.java",
            "package p2;\nimport p1.A;\npublic class B { field A a }\n",
        )
        .with_source(
            "P3",
            "src/p3/C.java",
            "package p3;\nimport p1.A;\npublic class C { field A a }\n",
        )
}

#[test]
fn test_rule_change_rebuilds_only_that_project() {
    let builder = builder();
    full_build(&builder, &three_projects(project("P2").requires("P1")));

    let restricted = three_projects(project("P2").with_required(
        RequiredProject::new("P1")
            .with_rules(AccessRuleSet::new(vec![AccessRule::discouraged("p1/**")])),
    ));
    let result = incremental_build(&builder, &restricted, ChangeSet::new());

    assert_eq!(compiled(&result), vec!["/P2/src/p2/B.java"]);
    assert_eq!(
        unit_messages(&result, "P2", "src/p2/B.java"),
        vec!["Discouraged access: The type 'A' is not API (restriction on required project 'P1')"]
    );
}

#[test]
fn test_library_content_change_rebuilds_users() {
    let builder = builder();
    let with_library = |library: Library| {
        WorkspaceSnapshot::new()
            .with_library(library)
            .with_project(project("P1").with_library(LibraryEntry::new("rt")))
            .with_project(project("P2"))
            .with_source(
                "P1",
                "src/p1/A.java",
                "package p1;\npublic class A { field lib.Gone g }\n",
            )
            .with_source("P2", "src/p2/B.java", "package p2;\npublic class B { }\n")
    };
    let first = full_build(
        &builder,
        &with_library(Library::new("rt").with_type(BinaryType::new("lib.Gone"))),
    );
    assert_no_problems(&first);

    let result = incremental_build(&builder, &with_library(Library::new("rt")), ChangeSet::new());

    assert_eq!(compiled(&result), vec!["/P1/src/p1/A.java"]);
    assert_eq!(
        unit_messages(&result, "P1", "src/p1/A.java"),
        vec!["lib.Gone cannot be resolved to a type"]
    );
}

#[test]
fn test_removed_project_dirties_units_that_saw_its_types() {
    let builder = builder();
    full_build(&builder, &indirect_workspace());

    let mut without_p1 = indirect_workspace();
    without_p1.remove_project(&ProjectId::new("P1"));
    without_p1.replace_project(project("P2"));
    let result = incremental_build(&builder, &without_p1, ChangeSet::new());

    assert_eq!(
        compiled(&result),
        vec!["/P2/src/p2/X.java", "/P3/src/p3/Z.java"]
    );
    assert_eq!(
        unit_messages(&result, "P2", "src/p2/X.java"),
        vec!["I cannot be resolved to a type"]
    );
    // p1.I no longer exists anywhere, so nothing is indirectly referenced.
    assert!(project_messages(&result, "P3").is_empty());
    assert!(unit_messages(&result, "P3", "src/p3/Z.java").is_empty());
    assert!(builder.inspect(|ctx| ctx.state(&ProjectId::new("P1")).is_none()));
}

