//! Compiler failures, cancellation and duplicate type definitions.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cascade::build::{BuildError, BuildRequest, BuildStatus, Builder};
use cascade::changes::ChangeSet;
use cascade::compiler::{
    ClasspathView, CompileError, CompileOutput, Compiler, OutlineCompiler, SourceUnit,
};
use cascade::workspace::WorkspaceSnapshot;
use cascade::{ProjectId, UnitPath};
use tokio_util::sync::CancellationToken;

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;

/// Panics on one unit, compiles everything else.
struct Exploding {
    target: &'static str,
}

impl Compiler for Exploding {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError> {
        if unit.path.as_str() == self.target {
            panic!("boom");
        }
        OutlineCompiler::new().compile(unit, classpath)
    }
}

/// Fails every unit while the switch is on.
#[derive(Default)]
struct Flaky {
    failing: AtomicBool,
}

impl Compiler for Flaky {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CompileError::failed("unsupported construct"));
        }
        OutlineCompiler::new().compile(unit, classpath)
    }
}

/// Requests cancellation once the first unit has compiled.
struct CancelAfterFirst {
    token: CancellationToken,
    calls: AtomicUsize,
}

impl Compiler for CancelAfterFirst {
    fn compile(
        &self,
        unit: &SourceUnit<'_>,
        classpath: &ClasspathView<'_>,
    ) -> Result<CompileOutput, CompileError> {
        let output = OutlineCompiler::new().compile(unit, classpath);
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.token.cancel();
        }
        output
    }
}

#[test]
fn test_compiler_panic_becomes_internal_error() {
    let builder = Builder::new(Exploding { target: A_PATH });

    let result = full_build(&builder, &a_b_workspace(A_SOURCE));

    assert_eq!(
        unit_messages(&result, "A", A_PATH),
        vec!["Internal compiler error: boom"]
    );
    // The rest of the workspace still builds.
    assert!(
        result
            .order
            .compiled(&ProjectId::new("B"), &UnitPath::new(B_PATH))
    );
    assert_eq!(result.status, BuildStatus::Complete);
}

#[test]
fn test_compile_error_keeps_previous_state() {
    let builder = Builder::new(Flaky::default());
    full_build(&builder, &a_b_workspace(A_SOURCE));

    builder.compiler().failing.store(true, Ordering::SeqCst);
    let edited = a_b_workspace("package a;\npublic class A { field int x }\n");
    let failed = incremental_build(&builder, &edited, ChangeSet::new().modified("A", A_PATH));

    assert_eq!(
        unit_messages(&failed, "A", A_PATH),
        vec!["Internal compiler error: unsupported construct"]
    );
    assert_eq!(compiled(&failed), vec!["/A/src/a/A.java"]);
    let still_defined = builder.inspect(|ctx| {
        ctx.state(&ProjectId::new("A"))
            .is_some_and(|s| s.defines(&"a.A".into()))
    });
    assert!(still_defined);

    builder.compiler().failing.store(false, Ordering::SeqCst);
    let recovered = incremental_build(&builder, &edited, ChangeSet::new().modified("A", A_PATH));

    assert_eq!(
        compiled(&recovered),
        vec!["/A/src/a/A.java", "/B/src/b/B.java"]
    );
    assert_no_problems(&recovered);
}

#[test]
fn test_cancellation_parks_remaining_units() {
    let token = CancellationToken::new();
    let builder = Builder::new(CancelAfterFirst {
        token: token.clone(),
        calls: AtomicUsize::new(0),
    });
    let snapshot = a_b_workspace(A_SOURCE);

    let cancelled = builder
        .build(&BuildRequest::full(snapshot.clone()).with_cancellation(token))
        .expect("build");

    assert_eq!(cancelled.status, BuildStatus::Cancelled);
    assert_eq!(compiled(&cancelled), vec!["/A/src/a/A.java"]);
    let pending = builder.inspect(|ctx| {
        ctx.state(&ProjectId::new("B"))
            .map(|s| s.pending().iter().map(|u| u.to_string()).collect::<Vec<_>>())
    });
    assert_eq!(pending, Some(vec![B_PATH.to_string()]));

    let resumed = incremental_build(&builder, &snapshot, ChangeSet::new());

    assert_eq!(resumed.status, BuildStatus::Complete);
    assert_eq!(compiled(&resumed), vec!["/B/src/b/B.java"]);
    assert_no_problems(&resumed);
}

#[test]
fn test_cancelled_before_start_compiles_nothing() {
    let token = CancellationToken::new();
    token.cancel();

    let result = builder()
        .build(&BuildRequest::full(a_b_workspace(A_SOURCE)).with_cancellation(token))
        .expect("build");

    assert_eq!(result.status, BuildStatus::Cancelled);
    assert!(result.order.is_empty());
}

#[test]
fn test_duplicate_type_reported_on_both_units() {
    let builder = builder();
    let snapshot = WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_source("P1", "src/p1/A.java", "package p1;\npublic class A { }\n")
        .with_source("P1", "src/p1/Dup.java", "package p1;\npublic class A { }\n");

    let result = full_build(&builder, &snapshot);

    let message = "The type p1.A is already defined";
    assert_eq!(unit_messages(&result, "P1", "src/p1/A.java"), vec![message]);
    assert_eq!(unit_messages(&result, "P1", "src/p1/Dup.java"), vec![message]);

    let without_dup = WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_source("P1", "src/p1/A.java", "package p1;\npublic class A { }\n");
    let result = incremental_build(
        &builder,
        &without_dup,
        ChangeSet::new().removed("P1", "src/p1/Dup.java"),
    );

    assert_no_problems(&result);
}

#[test]
fn test_syntax_error_is_a_unit_problem() {
    let snapshot = WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_source("P1", "src/p1/A.java", "package p1;\npublic class A { field }\n");

    let result = full_build(&builder(), &snapshot);

    assert_eq!(
        unit_messages(&result, "P1", "src/p1/A.java"),
        vec!["Syntax error on token \"}\", Identifier expected"]
    );
}

#[test]
fn test_unknown_project_in_change_set_is_rejected() {
    let error = builder()
        .build(&BuildRequest::incremental(
            a_b_workspace(A_SOURCE),
            ChangeSet::new().modified("Nope", "src/x/X.java"),
        ))
        .unwrap_err();

    assert!(matches!(error, BuildError::MissingProject(ref p) if p.as_str() == "Nope"));
}

#[test]
fn test_duplicate_project_is_rejected() {
    let snapshot = WorkspaceSnapshot::new()
        .with_project(project("P1"))
        .with_project(project("P1"));

    let error = builder()
        .build(&BuildRequest::full(snapshot))
        .unwrap_err();

    assert!(matches!(error, BuildError::DuplicateProject(_)));
}
