//! Projects requiring each other: cycle problems and multi-pass builds.

use std::sync::atomic::{AtomicU64, Ordering};

use cascade::build::{BuildOptions, BuildRequest, BuildStatus, Builder};
use cascade::changes::ChangeSet;
use cascade::compiler::{ClasspathView, CompileError, CompileOutput, Compiler, OutlineCompiler, SourceUnit};
use cascade::fingerprint::StructuralFingerprint;
use cascade::problem::{ProblemKind, Severity};
use cascade::workspace::WorkspaceSnapshot;
use cascade::{ProjectId, UnitPath};

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

const X_PATH: &str = "src/p1/X.java";
const Y_PATH: &str = "src/p2/Y.java";

fn cyclic_workspace() -> WorkspaceSnapshot {
    WorkspaceSnapshot::new()
        .with_project(project("P1").requires("P2"))
        .with_project(project("P2").requires("P1"))
        .with_source("P1", X_PATH, "package p1;\nimport p2.Y;\npublic class X { field Y y }\n")
        .with_source("P2", Y_PATH, "package p2;\npublic class Y { }\n")
}

fn cycle_message(project: &str) -> String {
    format!(
        "One or more cycles were detected in the build path of project '{project}'. The paths towards the cycle and cycle are:\n->{{P1, P2}}"
    )
}

#[test]
fn test_cycle_reports_one_problem_per_member() {
    let result = full_build(&builder(), &cyclic_workspace());

    assert_eq!(project_messages(&result, "P1"), vec![cycle_message("P1")]);
    assert_eq!(project_messages(&result, "P2"), vec![cycle_message("P2")]);
    let p1 = ProjectId::new("P1");
    let cycles = problems_of_kind(&result, &p1, ProblemKind::CycleDetected);
    assert_eq!(cycles[0].severity, Severity::Warning);
}

#[test]
fn test_cycle_passes_resolve_late_types() {
    let result = full_build(&builder(), &cyclic_workspace());

    // P1 first sees p2.Y unresolved, then again once P2 has compiled it.
    assert_eq!(
        compiled(&result),
        vec!["/P1/src/p1/X.java", "/P2/src/p2/Y.java", "/P1/src/p1/X.java"]
    );
    assert!(unit_messages(&result, "P1", X_PATH).is_empty());
    assert_eq!(result.status, BuildStatus::Complete);
}

#[test]
fn test_leading_into_cycle_is_reported() {
    let snapshot = cyclic_workspace().with_project(project("P0").requires("P1"));

    let result = full_build(&builder(), &snapshot);

    assert_eq!(
        project_messages(&result, "P0"),
        vec![
            "One or more cycles were detected in the build path of project 'P0'. The paths towards the cycle and cycle are:\nP0->{P1, P2}"
                .to_string()
        ]
    );
}

#[test]
fn test_breaking_cycle_clears_problems() {
    let builder = builder();
    full_build(&builder, &cyclic_workspace());

    let acyclic = WorkspaceSnapshot::new()
        .with_project(project("P1").requires("P2"))
        .with_project(project("P2"))
        .with_source("P1", X_PATH, "package p1;\nimport p2.Y;\npublic class X { field Y y }\n")
        .with_source("P2", Y_PATH, "package p2;\npublic class Y { }\n");
    let result = incremental_build(&builder, &acyclic, ChangeSet::new());

    assert_no_problems(&result);
    // P2's build path changed, so its units are rebuilt.
    assert_eq!(compiled(&result), vec!["/P2/src/p2/Y.java"]);
}

#[test]
fn test_full_build_after_removing_edge_has_no_cycle() {
    let builder = builder();
    full_build(&builder, &cyclic_workspace());

    let mut acyclic = cyclic_workspace();
    acyclic.replace_project(project("P2"));
    let result = full_build(&builder, &acyclic);

    let p1 = ProjectId::new("P1");
    let p2 = ProjectId::new("P2");
    assert!(problems_of_kind(&result, &p1, ProblemKind::CycleDetected).is_empty());
    assert!(problems_of_kind(&result, &p2, ProblemKind::CycleDetected).is_empty());
    assert_eq!(
        compiled(&result),
        vec!["/P2/src/p2/Y.java", "/P1/src/p1/X.java"]
    );
}

#[test]
fn test_cycle_as_error_blocks_members() {
    let builder = Builder::with_options(
        OutlineCompiler::new(),
        BuildOptions::default().with_cycle_severity(Severity::Error),
    );

    let result = full_build(&builder, &cyclic_workspace());

    assert!(result.order.is_empty());
    for name in ["P1", "P2"] {
        let messages = project_messages(&result, name);
        assert_eq!(messages.len(), 2, "{name}: {messages:?}");
        assert_eq!(messages[0], cycle_message(name));
        assert_eq!(
            messages[1],
            "The project cannot be built until build path errors are resolved"
        );
    }
    let p1 = ProjectId::new("P1");
    assert_eq!(
        problems_of_kind(&result, &p1, ProblemKind::CycleDetected)[0].severity,
        Severity::Error
    );
}

#[test]
fn test_cycle_as_error_without_abort_still_builds() {
    let builder = Builder::with_options(
        OutlineCompiler::new(),
        BuildOptions::default()
            .with_cycle_severity(Severity::Error)
            .with_abort_on_build_path_errors(false),
    );

    let result = full_build(&builder, &cyclic_workspace());

    assert!(!result.order.is_empty());
    assert_eq!(project_messages(&result, "P1"), vec![cycle_message("P1")]);
}

#[test]
fn test_three_project_cycle_order_and_lines() {
    let snapshot = WorkspaceSnapshot::new()
        .with_project(project("P1").requires("P2").requires("P3"))
        .with_project(project("P2").requires("P1").requires("P3"))
        .with_project(project("P3").requires("P1"))
        .with_source(
            "P1",
            X_PATH,
            "package p1;\nimport p2.Y;\npublic class X {\n  method void bar(Y)\n}\n",
        )
        .with_source(
            "P2",
            Y_PATH,
            "package p2;\nimport p1.X;\nimport p3.Z;\npublic class Y extends Z {\n  method X zork()\n}\n",
        )
        .with_source(
            "P3",
            "src/p3/Z.java",
            "package p3;\nimport p1.X;\npublic class Z {\n  method X foo()\n}\n",
        );

    let result = builder()
        .build(&BuildRequest::full(snapshot).with_order(["P1", "P2", "P3"]))
        .expect("build");

    // X and Y are compiled again once the types they saw missing exist.
    assert_eq!(
        compiled(&result),
        vec![
            "/P1/src/p1/X.java",
            "/P2/src/p2/Y.java",
            "/P3/src/p3/Z.java",
            "/P1/src/p1/X.java",
            "/P2/src/p2/Y.java",
        ]
    );
    assert_eq!(result.status, BuildStatus::Complete);
    let header = |name: &str| {
        format!(
            "One or more cycles were detected in the build path of project '{name}'. The paths towards the cycle and cycle are:\n"
        )
    };
    assert_eq!(
        project_messages(&result, "P1"),
        vec![format!("{}->{{P1, P2}}\n->{{P1, P2, P3}}\n->{{P1, P3}}", header("P1"))]
    );
    assert_eq!(
        project_messages(&result, "P2"),
        vec![format!("{}->{{P1, P2}}\n->{{P1, P2, P3}}", header("P2"))]
    );
    assert_eq!(
        project_messages(&result, "P3"),
        vec![format!("{}->{{P1, P2, P3}}\n->{{P1, P3}}", header("P3"))]
    );
    for (name, path) in [("P1", X_PATH), ("P2", Y_PATH), ("P3", "src/p3/Z.java")] {
        assert!(unit_messages(&result, name, path).is_empty(), "{name}");
    }
}

/// Gives every compiled type a fresh structural fingerprint, so a cycle
/// never settles.
#[derive(Default)]
struct Churning {
    compiles: AtomicU64,
}

impl Compiler for Churning {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError> {
        let mut output = OutlineCompiler::new().compile(unit, classpath)?;
        let salt = self.compiles.fetch_add(1, Ordering::SeqCst) + 1;
        for defined in &mut output.defined_types {
            defined.structural = StructuralFingerprint(defined.structural.0 ^ salt);
        }
        Ok(output)
    }
}

#[test]
fn test_cycle_pass_limit_leaves_units_pending() {
    let snapshot = WorkspaceSnapshot::new()
        .with_project(project("P1").requires("P2"))
        .with_project(project("P2").requires("P1"))
        .with_source("P1", X_PATH, "package p1;\nimport p2.Y;\npublic class X { field Y y }\n")
        .with_source("P2", Y_PATH, "package p2;\nimport p1.X;\npublic class Y { field X x }\n");
    let builder = Builder::new(Churning::default());

    let result = full_build(&builder, &snapshot);

    // Two members allow three passes; the last change to Y is left over.
    assert_eq!(
        compiled(&result),
        vec![
            "/P1/src/p1/X.java",
            "/P2/src/p2/Y.java",
            "/P1/src/p1/X.java",
            "/P2/src/p2/Y.java",
            "/P1/src/p1/X.java",
            "/P2/src/p2/Y.java",
        ]
    );
    assert_eq!(result.status, BuildStatus::Incomplete);
    let pending = |name: &str| {
        builder.inspect(|ctx| {
            ctx.state(&ProjectId::new(name))
                .map(|state| state.pending().iter().cloned().collect::<Vec<_>>())
        })
    };
    assert_eq!(pending("P1"), Some(vec![UnitPath::new(X_PATH)]));
    assert_eq!(pending("P2"), Some(Vec::new()));
}
